pub mod path_security;

pub use path_security::{
    validate_import_path, validate_import_path_within, validate_zip_entry_name, PathSecurityError,
    PathValidator, SecurePath, COURSE_EXTENSIONS,
};
