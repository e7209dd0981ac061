pub mod badges;
mod nom_parser;
pub mod tags;
mod types;

pub use self::badges::{decode_badge, decode_badges, Badge, BadgeList};
pub use self::tags::Tags;
pub use self::types::DecodedMessage;
