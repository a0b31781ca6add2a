pub mod directory_exist;
pub mod redirect_source;
pub mod s3_target;
