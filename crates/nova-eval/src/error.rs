use thiserror::Error;

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("jdwp: {0}")]
    Jdwp(#[from] nova_jdwp::JdwpError),
    #[error("`{name}` is not available in the current context")]
    NotAvailable { name: String },
}
