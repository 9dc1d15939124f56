mod captions;
mod page;
mod player;
mod text;
mod video;

pub use captions::{caption_text, with_json3_format};
pub use page::{HttpPageSource, PageContext, PageSource};
pub use player::{find_player_response, PlayerResponse};
pub use text::TextExtractor;
pub use video::{thumbnail_url, video_id_from_url};
