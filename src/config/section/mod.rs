//! Configuration section definitions.
//!
//! Each module corresponds to a section in `kiln.toml`:
//!
//! | Module  | TOML Section | Purpose                                   |
//! |---------|--------------|-------------------------------------------|
//! | `build` | `[build]`    | Source root, entry, template, output      |
//! | `css`   | `[css]`      | Vendor-prefix browser targets             |
//! | `js`    | `[js]`       | Transpile target                          |
//! | `serve` | `[serve]`    | Development server                        |

mod build;
mod css;
mod js;
mod serve;

pub use build::BuildConfig;
pub use css::{CssConfig, CssTargets, encode_version};
pub use js::JsConfig;
pub use serve::ServeConfig;
