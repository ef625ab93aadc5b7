// LSP protocol layer
// - server.rs: LSP server initialization over stdio
// - backend.rs: LanguageServer trait implementation and document lifecycle
// - settings.rs: Per-document settings cache (pull or global mode)
// - validation.rs: Tool invocation, report parsing and publish policy
// - diagnostics.rs: Diagnostics generation

pub mod backend;
pub mod diagnostics;
pub mod server;
pub mod settings;
pub mod validation;
