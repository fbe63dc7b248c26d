//! Hash command - Print the scoped name of one class

use clap::Args;
use pochoir::carton::{scoped_name, NamingScheme};

use super::NamingArg;

#[derive(Args)]
pub struct HashArgs {
    /// Class name, without the leading dot
    pub class: String,

    /// Namespace-qualified module path (my-app/components/card/styles.scoped.scss)
    pub module_path: String,

    /// Scoped name scheme
    #[arg(long, value_enum, default_value = "flat")]
    pub naming: NamingArg,
}

pub fn run(args: HashArgs) {
    let class = args.class.strip_prefix('.').unwrap_or(&args.class);
    let scheme: NamingScheme = args.naming.into();
    println!("{}", scoped_name(class, &args.module_path, scheme));
}
