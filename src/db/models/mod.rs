mod certificate;
mod progress;
mod user;

pub use certificate::*;
pub use progress::*;
pub use user::*;
