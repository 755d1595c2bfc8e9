mod article;
mod email;

pub use article::*;
pub use email::*;
