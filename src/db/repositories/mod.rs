mod diagnostics;
mod interviews;
