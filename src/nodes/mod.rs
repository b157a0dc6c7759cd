mod generator;
mod introspect;
mod locator;
mod record;
mod scanner;

pub use generator::{NodeSchemaGenerator, SchemaGenerator};
pub use introspect::{
    parse_functions, FunctionDescriptor, FunctionIntrospector, ParamDescriptor, ParamKind,
    PythonIntrospector,
};
pub use locator::{NodepackLocator, NODEPACKS_DIR_NAME};
pub use record::SchemaRecord;
pub use scanner::{SchemaScanner, OPS_FILE_NAME};
