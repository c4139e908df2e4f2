mod debugger;
mod diagnostics;
mod logging;
mod schema;
