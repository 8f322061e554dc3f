//! Per-session Lua VM construction and execution.

use crate::convert;
use crate::error::LuaError;
use jantteri_event::StructuredEvent;
use jantteri_runtime::{Checkpoint, ScriptHost, ScriptOutcome, SessionContext, StopSignal};
use mlua::{Lua, LuaOptions, MultiValue, StdLib, Value};

/// Globals removed from every session VM.
pub const BLOCKED_GLOBALS: &[&str] = &[
    "io", "os", "debug", "package", "require", "load", "loadfile", "dofile",
];

/// Chunk name shown in script error messages (`session:3: ...`).
const CHUNK_NAME: &str = "=session";

/// [`ScriptHost`] that runs scripts in a sandboxed Lua 5.4 VM.
///
/// Stateless: every [`execute`](ScriptHost::execute) call builds its own VM
/// on the calling thread, so no interpreter state is shared between
/// sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuaHost;

impl LuaHost {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Creates a sandboxed VM with the session callbacks bound to `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`LuaError`] if the VM or a callback cannot be created.
    pub fn create_lua(&self, ctx: &SessionContext) -> Result<Lua, LuaError> {
        // Only libraries that cannot reach outside the VM are loaded.
        let libs = StdLib::COROUTINE | StdLib::TABLE | StdLib::STRING | StdLib::UTF8 | StdLib::MATH;
        let lua = Lua::new_with(libs, LuaOptions::new())?;

        let globals = lua.globals();
        for name in BLOCKED_GLOBALS {
            globals.raw_set(*name, Value::Nil)?;
        }

        register_callbacks(&lua, ctx)?;
        Ok(lua)
    }
}

impl ScriptHost for LuaHost {
    fn name(&self) -> &'static str {
        "Lua"
    }

    fn execute(&self, ctx: &SessionContext, script: &str) -> ScriptOutcome {
        let lua = match self.create_lua(ctx) {
            Ok(lua) => lua,
            Err(e) => {
                tracing::error!(session_id = %ctx.id(), error = %e, "Failed to create Lua VM");
                return ScriptOutcome::Failed(e.to_string());
            }
        };

        match lua.load(script).set_name(CHUNK_NAME).exec() {
            Ok(()) => ScriptOutcome::Completed,
            Err(e) if is_stop_signal(&e) => {
                tracing::debug!(session_id = %ctx.id(), "Script unwound by stop signal");
                ScriptOutcome::Stopped
            }
            Err(e) => ScriptOutcome::Failed(format_lua_error(&e)),
        }
    }
}

/// Installs `print`, `wait` and `send_activate_event`.
fn register_callbacks(lua: &Lua, ctx: &SessionContext) -> Result<(), LuaError> {
    let globals = lua.globals();

    let print_ctx = ctx.clone();
    let print = lua.create_function(move |_, args: MultiValue| {
        let text = convert::join_display(args.iter());
        raise_on_stop(print_ctx.emit_text(text))
    })?;
    globals.set("print", print)?;

    let wait_ctx = ctx.clone();
    let wait = lua.create_function(move |_, seconds: Value| {
        raise_on_stop(wait_ctx.checkpoint())?;
        let duration = convert::wait_duration(&seconds)?;
        raise_on_stop(wait_ctx.sleep(duration))
    })?;
    globals.set("wait", wait)?;

    let event_ctx = ctx.clone();
    let send_activate_event =
        lua.create_function(move |_, (device_id, delay): (Value, Value)| {
            raise_on_stop(event_ctx.emit_event(|| {
                let device_id = convert::device_id(&device_id)?;
                let delay = convert::delay(&delay)?;
                StructuredEvent::activate_request(device_id, delay)
            }))
        })?;
    globals.set("send_activate_event", send_activate_event)?;

    Ok(())
}

/// Maps [`Checkpoint::Stop`] to a Lua error carrying [`StopSignal`], which
/// unwinds the script.
fn raise_on_stop(checkpoint: Checkpoint) -> mlua::Result<()> {
    checkpoint.into_result().map_err(mlua::Error::external)
}

/// Walks callback and context wrappers looking for a [`StopSignal`].
fn is_stop_signal(err: &mlua::Error) -> bool {
    match err {
        mlua::Error::CallbackError { cause, .. } | mlua::Error::WithContext { cause, .. } => {
            is_stop_signal(cause)
        }
        mlua::Error::ExternalError(e) => e.downcast_ref::<StopSignal>().is_some(),
        _ => false,
    }
}

fn format_lua_error(err: &mlua::Error) -> String {
    match err {
        mlua::Error::RuntimeError(msg) => msg.clone(),
        mlua::Error::CallbackError { cause, .. } => format_lua_error(cause),
        mlua::Error::SyntaxError { message, .. } => format!("compile error: {message}"),
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jantteri_runtime::{CancelToken, EventPublisher, Rooms, Subscription};
    use std::sync::Arc;
    use std::time::Duration;

    fn context() -> (SessionContext, CancelToken, Subscription) {
        let rooms = Arc::new(Rooms::new());
        let id = "LUALUA".parse().unwrap();
        let sub = rooms.join(&id);
        let cancel = CancelToken::new();
        let ctx = SessionContext::new(id, cancel.clone(), rooms)
            .with_sleep_slice(Duration::from_millis(10));
        (ctx, cancel, sub)
    }

    fn texts(sub: &mut Subscription) -> Vec<String> {
        sub.drain()
            .iter()
            .filter_map(|p| p.console_text().map(str::to_owned))
            .collect()
    }

    #[test]
    fn blocked_globals_are_nil() {
        let (ctx, _cancel, _sub) = context();
        let lua = LuaHost::new().create_lua(&ctx).unwrap();

        for name in BLOCKED_GLOBALS {
            let value: Value = lua.globals().get(*name).unwrap();
            assert!(value.is_nil(), "{name} should be removed");
        }
        for name in ["print", "wait", "send_activate_event", "string", "math", "pcall"] {
            let value: Value = lua.globals().get(name).unwrap();
            assert!(!value.is_nil(), "{name} should be available");
        }
    }

    #[test]
    fn completes_and_prints() {
        let (ctx, _cancel, mut sub) = context();
        let outcome = LuaHost::new().execute(&ctx, r#"print("hello", 1, 2.0, nil)"#);

        assert_eq!(outcome, ScriptOutcome::Completed);
        assert_eq!(texts(&mut sub), vec!["hello 1 2.0 nil"]);
    }

    #[test]
    fn runtime_error_is_failed() {
        let (ctx, _cancel, _sub) = context();
        let outcome = LuaHost::new().execute(&ctx, r#"error("boom")"#);

        match outcome {
            ScriptOutcome::Failed(reason) => {
                assert!(reason.contains("boom"), "{reason}");
                assert!(reason.starts_with("session:1:"), "{reason}");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn syntax_error_is_failed() {
        let (ctx, _cancel, _sub) = context();
        let outcome = LuaHost::new().execute(&ctx, "print(");
        assert!(
            matches!(outcome, ScriptOutcome::Failed(ref r) if r.starts_with("compile error:")),
            "{outcome:?}"
        );
    }

    #[test]
    fn stop_before_print_unwinds() {
        let (ctx, cancel, mut sub) = context();
        cancel.cancel();

        let outcome = LuaHost::new().execute(&ctx, r#"print("never")"#);
        assert_eq!(outcome, ScriptOutcome::Stopped);
        assert!(texts(&mut sub).is_empty());
    }

    #[test]
    fn stop_signal_rethrown_from_pcall_is_still_stop() {
        let (ctx, cancel, _sub) = context();
        cancel.cancel();

        let outcome = LuaHost::new().execute(
            &ctx,
            r#"
local ok, err = pcall(print, "x")
error(err)
"#,
        );
        assert_eq!(outcome, ScriptOutcome::Stopped);
    }

    #[test]
    fn wait_rejects_non_numbers() {
        let (ctx, _cancel, _sub) = context();
        let outcome = LuaHost::new().execute(&ctx, r#"wait({})"#);
        match outcome {
            ScriptOutcome::Failed(reason) => assert!(reason.contains("wait"), "{reason}"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn stop_signal_detection() {
        let stop = mlua::Error::external(StopSignal);
        assert!(is_stop_signal(&stop));

        let wrapped = mlua::Error::CallbackError {
            traceback: String::new(),
            cause: Arc::new(stop),
        };
        assert!(is_stop_signal(&wrapped));
        assert!(!is_stop_signal(&mlua::Error::RuntimeError("x".into())));
    }
}
