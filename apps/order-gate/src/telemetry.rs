//! Tracing subscriber setup.
//!
//! Console logging with an environment filter. `RUST_LOG` overrides the
//! defaults, e.g. `RUST_LOG=order_gate=debug`.

/// Initialize the tracing subscriber with environment filter.
///
/// Uses static directive strings that are compile-time constants guaranteed
/// to parse.
///
/// # Panics
///
/// Panics if a second subscriber was already installed; call once from the
/// binary entry point.
#[allow(clippy::expect_used)]
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(
                    "order_gate=info"
                        .parse()
                        .expect("static directive 'order_gate=info' is valid"),
                )
                .add_directive(
                    "sqlx=warn"
                        .parse()
                        .expect("static directive 'sqlx=warn' is valid"),
                ),
        )
        .init();
}
