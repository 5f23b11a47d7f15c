mod compose;
mod encode;
mod error;
pub mod font;
mod generate;
pub mod output;
pub mod payload;
mod render;
pub mod validate;

pub use compose::{load_logo, LogoCompositor, LogoPlacement, TitleCompositor, LOGO_EXTENSIONS};
pub use encode::{EncodingError, SymbolEncoder};
pub use error::Error;
pub use generate::Generator;
pub use output::{Generated, OutputFormat, OutputTarget};
pub use render::{AsciiRenderer, Rasterizer, SvgRenderer};
