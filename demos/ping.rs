//! Ping example using an isolated messenger.
//!
//! Registers a weakly held listener, sends a few pings, then drops the
//! listener and shows that the next send purges its registration. A
//! synchronized counter is shared with a strongly held auditor.
//!
//! Run with: cargo run --example ping --features logging

use std::sync::Arc;

use mom_messenger::{
    // ---
    KeepAliveMode,
    LockingStrategy,
    Messenger,
    MessengerConfig,
    SynchronizedValue,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt as tracing_format, EnvFilter};

struct Ping {
    seq: u32,
}

struct Shutdown;

struct Listener {
    name: &'static str,
}

struct Auditor {
    seen: SynchronizedValue<Vec<u32>>,
}

fn main() {
    // ---
    #[cfg(feature = "logging")]
    tracing_format()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_line_number(true)
        .init();

    let messenger = Messenger::with_config(MessengerConfig::named("demo"));
    let delivered = Arc::new(SynchronizedValue::with_strategy(0u32, LockingStrategy::ReadWrite));

    let listener = Arc::new(Listener { name: "listener-1" });
    {
        let delivered = delivered.clone();
        messenger.register(&listener, move |l: &Listener, ping: &Ping| {
            println!("{} got ping #{}", l.name, ping.seq);
            delivered.update(|n| n + 1);
        });
    }

    let auditor = Arc::new(Auditor {
        seen: SynchronizedValue::default(),
    });
    let audit = messenger.register_with(
        &auditor,
        |a: &Auditor, ping: &Ping| a.seen.with_mut(|seen| seen.push(ping.seq)),
        KeepAliveMode::KeepAlive,
    );

    for seq in 1..=3 {
        messenger.send(&Ping { seq });
    }
    println!("pings delivered to listener: {}", delivered.get());

    drop(listener);
    messenger.send(&Shutdown);
    println!(
        "ping registrations after listener dropped: {}",
        messenger.registration_count::<Ping>()
    );

    messenger.send(&Ping { seq: 4 });
    println!("auditor saw: {:?}", auditor.seen.get());

    audit.dispose();
    println!("ping registrations after audit disposed: {}", messenger.registration_count::<Ping>());
}
