//! Private macros.

/// Evaluates `$block`, logging how long it took under `$msg`.
macro_rules! elapsed {
    ($msg:expr, $block:expr) => {{
        let start = ::std::time::Instant::now();
        let out = $block;
        let elapsed = &start.elapsed();

        info!("{} took {:.3} ms", $msg, elapsed.as_secs_f64() * 1e3);

        out
    }};
}
