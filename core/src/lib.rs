mod address;
mod amount;
mod call;
mod type_tag;

pub use address::*;
pub use amount::*;
pub use call::*;
pub use type_tag::*;
