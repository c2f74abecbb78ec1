//! Constants

pub(crate) const INTERNAL_SERVER_ERROR_MESSAGE: &str = "internal server error";

// for `POST /predict`
pub(crate) const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
// whole request: the file plus room for `user_id` and the multipart framing
pub(crate) const MAX_PREDICT_REQUEST_BYTES: u64 = MAX_UPLOAD_BYTES as u64 + 64 * 1024;
pub(crate) const FILE_FIELD: &str = "file";
pub(crate) const USER_ID_FIELD: &str = "user_id";

// for `POST /register` and `POST /login`
pub(crate) const MAX_FORM_BYTES: u64 = 64 * 1024;

// for blob names
pub(crate) const BLOB_SUFFIX_LENGTH: usize = 6;

// defaults for env config
pub(crate) const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub(crate) const DEFAULT_PREDICTOR_URL: &str = "http://127.0.0.1:5000/predict";
pub(crate) const DEFAULT_PUBLIC_URL_BASE: &str = "https://storage.googleapis.com";
pub(crate) const DEFAULT_LOCAL_STORAGE_DIR: &str = "./uploads";
pub(crate) const DEFAULT_BUCKET: &str = "uploads";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_LOG_FILTER: &str = "nail_server=debug,tower_http=debug";
