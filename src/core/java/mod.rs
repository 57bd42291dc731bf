pub mod runtime;

pub use runtime::java_exe;
pub use runtime::locate_java_binary;
pub use runtime::resolve_java_binary;
