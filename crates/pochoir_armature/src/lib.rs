//! # pochoir_armature
//!
//! Armature - The structural framework that holds a template together.
//!
//! ## Name Origin
//!
//! An **armature** is the internal frame a sculptor builds before adding clay.
//! This crate builds the frame of a template: [`parse_template`] turns
//! Handlebars-flavoured HTML into a [`pochoir_relief::Template`], and
//! [`print_template`] turns it back into text.
//!
//! Printing is lossless. A template that was parsed and not modified prints
//! byte for byte as its source; a modified template only differs inside the
//! locations of the nodes that were replaced.
//!
//! ```
//! use pochoir_armature::{parse_template, print_template};
//!
//! let source = "<div class={{s.card}}>{{title}}</div>\n";
//! let template = parse_template(source, "card/template.hbs").unwrap();
//! assert_eq!(print_template(&template), source);
//! ```

mod parser;
mod printer;

pub use parser::{is_void_element, parse_template};
pub use printer::print_template;
