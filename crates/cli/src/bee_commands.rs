use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use {
    anyhow::{Result, bail},
    hive_bees::{Action, Event, EventReceiver, FactoryInfo, FactoryRegistry, Placeholders},
    hive_config::HiveConfig,
    hive_runtime::{Hive, builtin_registry},
    tracing::{debug, error},
};

pub fn list_factories(registry: &FactoryRegistry) -> Result<()> {
    for factory in registry.factories() {
        println!("{:<16} {:<12} {}", factory.id(), factory.name(), factory.description());
    }
    Ok(())
}

pub fn describe(registry: &FactoryRegistry, id: &str) -> Result<()> {
    let factory = registry.try_get(id)?;
    let info = FactoryInfo::from_factory(factory.as_ref());
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

/// Start all configured bees, run one action, then print every event that
/// arrives within `wait_ms` as a JSON line.
pub async fn trigger(config: &HiveConfig, bee: &str, action: &str, wait_ms: u64) -> Result<()> {
    let (hive, rx) = Hive::from_config(Arc::new(builtin_registry()), config);
    hive.start_all(config).await?;

    let wait = Duration::from_millis(wait_ms);
    let (out, events) = match collect_action(&hive, rx, Action::new(bee, action), wait).await {
        Ok(collected) => collected,
        Err(e) if e.is_contract_violation() => {
            error!(bee, action, error = %e, "action is not declared by the bee");
            bail!("contract violation: {e}");
        },
        Err(e) => return Err(e.into()),
    };
    if !out.is_empty() {
        println!("{}", serde_json::to_string(&out)?);
    }
    for event in &events {
        println!("{}", serde_json::to_string(event)?);
    }
    debug!(events = events.len(), "trigger finished");
    Ok(())
}

/// Dispatch `action` while draining `rx`, so a bee emitting more events than
/// the channel holds is never left waiting. Keeps receiving for `wait` after
/// the action returned.
pub async fn collect_action(
    hive: &Hive,
    mut rx: EventReceiver,
    action: Action,
    wait: Duration,
) -> hive_runtime::Result<(Placeholders, Vec<Event>)> {
    let mut events = Vec::new();
    let dispatch = hive.dispatch(action);
    tokio::pin!(dispatch);
    let out = loop {
        tokio::select! {
            out = &mut dispatch => break out?,
            Some(event) = rx.recv() => events.push(event),
        }
    };

    let deadline = tokio::time::Instant::now() + wait;
    while let Ok(Some(event)) = tokio::time::timeout_at(deadline, rx.recv()).await {
        events.push(event);
    }
    Ok((out, events))
}

pub async fn oauth(
    registry: &FactoryRegistry,
    factory: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
) -> Result<()> {
    let factory = registry.try_get(factory)?;
    let tokens = factory
        .oauth2_access_token(client_id, client_secret, code)
        .await?;

    let kind = tokens.token_type.as_deref().unwrap_or("access");
    match tokens.expires_at {
        Some(at) => {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            println!(
                "received {kind} token for {}, expires in {}s",
                factory.id(),
                at.saturating_sub(now)
            );
        },
        None => println!("received {kind} token for {}, no expiry", factory.id()),
    }
    if tokens.refresh_token.is_some() {
        println!("a refresh token was issued");
    }
    Ok(())
}
