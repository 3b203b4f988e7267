//! Built-in token cards
//!
//! Status markers that are not part of the draftable card pool but are
//! exported next to real cards so play aids can show them.

use crate::core::{NameList, NormalizedCard};
use crate::profile::OutputProfile;

/// Card type carried by every token
pub const TOKEN_TYPE: &str = "Token";

struct TokenDef {
    name: &'static str,
    text: &'static str,
}

const TOKENS: [TokenDef; 3] = [
    TokenDef {
        name: "The Edge",
        text: "During your unlock phase, if you control the Edge, you may gain 1 pool.",
    },
    TokenDef {
        name: "Blood Counter",
        text: "Status counter tracking blood on a minion.",
    },
    TokenDef {
        name: "Pool Counter",
        text: "Status counter tracking a Methuselah's pool.",
    },
];

/// The built-in tokens as normalized cards, filtered like feed cards
pub fn builtin_tokens(profile: &OutputProfile) -> Vec<NormalizedCard> {
    TOKENS
        .iter()
        .map(|def| {
            let mut types = NameList::new();
            types.push(TOKEN_TYPE.to_string());

            let mut card = NormalizedCard::new(def.name, types);
            card.is_token = true;
            card.text = Some(def.text.to_string());
            profile.strip(card)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tokens_are_library_tokens() {
        let tokens = builtin_tokens(&OutputProfile::full());
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].name, "The Edge");
        for token in &tokens {
            assert!(token.is_token);
            assert!(!token.is_crypt);
            assert_eq!(token.types.as_slice(), [TOKEN_TYPE.to_string()]);
            assert!(token.sets.is_empty());
            assert!(token.text.is_some());
        }
    }

    #[test]
    fn test_builtin_tokens_follow_profile() {
        let tokens = builtin_tokens(&OutputProfile::wmrh());
        assert!(tokens.iter().all(|t| t.text.is_none()));
    }
}
