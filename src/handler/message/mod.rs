mod broadcast;
mod photo;

pub use broadcast::handle_broadcast_text;
pub use photo::handle_photo;
