use rand::seq::SliceRandom;
use rand::Rng;

pub const ADJECTIVES: &[&str] = &[
    "Amber", "Brave", "Calm", "Clever", "Crimson", "Curious", "Dusty",
    "Eager", "Fierce", "Gentle", "Golden", "Hidden", "Icy", "Jolly",
    "Lucky", "Mellow", "Nimble", "Quiet", "Rapid", "Silent", "Sly",
    "Sunny", "Swift", "Wild",
];

pub const NOUNS: &[&str] = &[
    "Badger", "Bison", "Condor", "Coyote", "Crane", "Falcon", "Ferret",
    "Fox", "Gecko", "Heron", "Ibis", "Jackal", "Lark", "Lemur", "Lynx",
    "Marmot", "Otter", "Owl", "Panda", "Puffin", "Raven", "Stork",
    "Viper", "Wolf",
];

/// Mints a display identity of the form `<Adjective><Noun><1-999>`.
///
/// No uniqueness check against live sessions; two connections may share a
/// pseudonym.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("Silent");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("Fox");
    let number: u16 = rng.gen_range(1..=999);
    format!("{adjective}{noun}{number}")
}
