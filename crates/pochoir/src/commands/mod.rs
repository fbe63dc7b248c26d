pub mod build;
pub mod hash;

use clap::ValueEnum;
use pochoir::atelier_style::TraversalMode;
use pochoir::atelier_template::TemplateMode;
use pochoir::carton::NamingScheme;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum NamingArg {
    /// `<class>_<hash>`
    Flat,
    /// `<component>_<class>_<hash>`
    Prefixed,
}

impl From<NamingArg> for NamingScheme {
    fn from(arg: NamingArg) -> Self {
        match arg {
            NamingArg::Flat => NamingScheme::Flat,
            NamingArg::Prefixed => NamingScheme::Prefixed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TraversalArg {
    /// Top-level rules only
    Shallow,
    /// Rules nested in other rules and at-rules too
    Deep,
}

impl From<TraversalArg> for TraversalMode {
    fn from(arg: TraversalArg) -> Self {
        match arg {
            TraversalArg::Shallow => TraversalMode::Shallow,
            TraversalArg::Deep => TraversalMode::Deep,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TemplateModeArg {
    /// Parse, replace nodes, print
    Ast,
    /// Regular expressions over the raw text
    Scanner,
}

impl From<TemplateModeArg> for TemplateMode {
    fn from(arg: TemplateModeArg) -> Self {
        match arg {
            TemplateModeArg::Ast => TemplateMode::Ast,
            TemplateModeArg::Scanner => TemplateMode::Scanner,
        }
    }
}
