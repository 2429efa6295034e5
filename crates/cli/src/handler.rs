use eyre::EyreHandler;
use srcfetch_common::errors::{dedup_chain, display_chain};
use srcfetch_config::Config;
use std::{error::Error, fmt};

/// Renders srcfetch errors for the terminal.
///
/// `Display` joins the deduplicated error chain on a single line. `Debug`, which is what a
/// failing `main` prints, puts the outermost error first and lists the remaining causes below
/// it. With a debug handler set, `Debug` defers to it instead.
#[derive(Default)]
pub struct Handler {
    debug_handler: Option<Box<dyn EyreHandler>>,
}

impl Handler {
    /// Create a new instance of the `Handler`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the debug handler with a custom one.
    pub fn debug_handler(mut self, debug_handler: Option<Box<dyn EyreHandler>>) -> Self {
        self.debug_handler = debug_handler;
        self
    }
}

impl EyreHandler for Handler {
    fn display(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display_chain(error))
    }

    fn debug(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(debug_handler) = &self.debug_handler {
            return debug_handler.debug(error, f);
        }
        if f.alternate() {
            return fmt::Debug::fmt(error, f);
        }

        let chain = dedup_chain(error);
        let Some((error, causes)) = chain.split_first() else { return Ok(()) };
        f.write_str(error)?;
        match causes {
            [] => Ok(()),
            [cause] => write!(f, "\n\nCaused by: {cause}"),
            causes => {
                f.write_str("\n\nCaused by:")?;
                causes.iter().enumerate().try_for_each(|(n, cause)| write!(f, "\n  {n}: {cause}"))
            }
        }
    }

    fn track_caller(&mut self, location: &'static std::panic::Location<'static>) {
        if let Some(debug_handler) = &mut self.debug_handler {
            debug_handler.track_caller(location);
        }
    }
}

/// Installs the srcfetch [`eyre`] and [`panic`](mod@std::panic) hooks as the global ones.
///
/// Errors are reported by [`Handler`], unless `SRCFETCH_DEBUG` is set, in which case the
/// color-eyre report with its span trace is used. Panics always get the color-eyre report.
pub fn install() {
    let panic_section =
        "This is a bug. Consider reporting it at https://github.com/srcfetch/srcfetch";
    let (panic_hook, debug_hook) =
        color_eyre::config::HookBuilder::default().panic_section(panic_section).into_hooks();
    panic_hook.install();

    let debug_hook = debug_hook.into_eyre_hook();
    let debug = std::env::var_os(Config::env_var(Config::DEBUG_ENV_KEY)).is_some();
    if let Err(e) = eyre::set_hook(Box::new(move |e| {
        Box::new(Handler::new().debug_handler(debug.then(|| debug_hook(e))))
    })) {
        debug!("failed to install eyre error hook: {e}");
    }
}
