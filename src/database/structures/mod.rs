mod collection_name;
mod game_match;
mod menu_item;
mod player;
mod review;

pub use game_match::Match;
pub use menu_item::MenuItem;
pub use player::NewPlayer;
pub use player::Player;
pub use player::PlayerProfile;
pub use review::Review;

pub use collection_name::CollectionName;
