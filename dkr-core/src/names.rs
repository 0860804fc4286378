//! Docker-style container names.

use rand::seq::SliceRandom;

const ADJECTIVES: &[&str] = &[
    "brave", "calm", "cool", "eager", "fast", "happy", "keen", "mild", "neat", "quick", "sharp",
    "warm", "bold", "dark", "fair", "glad", "lush", "pure", "safe", "wise",
];

const NOUNS: &[&str] = &[
    "panda", "tiger", "whale", "eagle", "falcon", "otter", "raven", "shark", "cobra", "heron",
    "maple", "cedar", "birch", "aspen", "coral", "frost", "ember", "drift", "storm",
];

/// Random `adjective-noun` name for the disposable work branch and hostname.
pub fn random_name() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("brave");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("panda");
    format!("{adjective}-{noun}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_adjective_noun() {
        for _ in 0..50 {
            let name = random_name();
            let (adjective, noun) = name.split_once('-').expect("dash-separated");
            assert!(ADJECTIVES.contains(&adjective));
            assert!(NOUNS.contains(&noun));
        }
    }
}
