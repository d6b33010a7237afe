use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` 優先；否則只看本服務的日誌，verbose 時打開 debug（逐筆配對與送達）
fn dispatch_filter(verbose: bool) -> EnvFilter {
    let directives = if verbose {
        "delivery_dispatch=debug,info"
    } else {
        "delivery_dispatch=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(dispatch_filter(verbose))
        .with(
            fmt::layer()
                // 只有 verbose 時才需要分辨是哪個循環打的日誌
                .with_target(verbose)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

pub fn init_json_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(dispatch_filter(verbose))
        .with(
            fmt::layer()
                .json()
                // order_id / courier_id 成為頂層欄位，方便依訂單查詢
                .flatten_event(true)
                .with_current_span(false)
                .with_span_list(false)
                .with_target(true),
        )
        .init();
}
