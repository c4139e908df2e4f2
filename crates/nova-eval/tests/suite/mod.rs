mod bindings;
mod errors;
mod locals;
