//! Khách Vui CLI
//!
//! Terminal front-end for shop owners:
//! - Register, log in and out
//! - Manage shops, gateways, tables, devices and device messages
//! - Send and schedule table reminders
//! - Listen to the gateway push channel

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use khachvui::auth::{AuthFlow, GoTrueClient, LoginForm, RegistrationForm, Session, REGISTERED_MESSAGE};
use khachvui::config::Config;
use khachvui::dashboard::DashboardContext;
use khachvui::models::{
    DevicePatch, MessageKind, NewDevice, NewDiningTable, NewGateway, NewShop, ReminderStatus,
    ReminderUnit, ShopPatch, TableStatus,
};
use khachvui::notifications::{Chime, NotificationEvent, NotificationStore, SilentChime, TerminalBell};
use khachvui::push::{PushConfig, PushHandle, WsConnector};
use khachvui::repo::Repository;
use khachvui::store::{RecordStore, RestStore};

#[derive(Parser)]
#[command(name = "khachvui-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Quản lý cửa hàng, bàn và thiết bị Khách Vui")]
#[command(long_about = "Khách Vui admin CLI.\nManage shops, gateways, tables and table devices, and follow calls from the gateways.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the usual locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        /// Business name
        #[arg(long)]
        business: String,
        /// restaurant, cafe, bar, ...
        #[arg(long)]
        business_type: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Accept the terms of service
        #[arg(long)]
        terms: bool,
        #[arg(long)]
        newsletter: bool,
    },

    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign out and forget the session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Counts across all of your shops
    Overview,

    /// Manage shops
    Shops {
        #[command(subcommand)]
        action: ShopAction,
    },

    /// Manage the gateways of a shop
    Gateways {
        shop_id: String,
        #[command(subcommand)]
        action: GatewayAction,
    },

    /// Manage the tables of a shop
    Tables {
        shop_id: String,
        #[command(subcommand)]
        action: TableAction,
    },

    /// Manage the devices of a shop
    Devices {
        shop_id: String,
        #[command(subcommand)]
        action: DeviceAction,
    },

    /// Manage the messages shown by a device
    Messages {
        device_id: String,
        #[command(subcommand)]
        action: MessageAction,
    },

    /// Manage the reminders of a shop
    Reminders {
        shop_id: String,
        #[command(subcommand)]
        action: ReminderAction,
    },

    /// Follow calls and reminders from the gateway push channel
    Listen {
        /// Push channel URL (default: from config)
        #[arg(long)]
        url: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ShopAction {
    List,
    Add {
        name: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Reminder delay amount
        #[arg(long, default_value = "30")]
        reminder_time: u32,
        /// seconds, minutes or hours
        #[arg(long, default_value = "minutes")]
        reminder_unit: ReminderUnit,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        reminder_time: Option<u32>,
        #[arg(long)]
        reminder_unit: Option<ReminderUnit>,
    },
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum GatewayAction {
    List,
    Add {
        name: String,
        /// Address of the gateway on the shop network
        server_ip: String,
    },
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum TableAction {
    List,
    Add {
        number: String,
        #[arg(long)]
        details: Option<String>,
    },
    /// Set empty, occupied or reserved
    Status {
        id: String,
        status: TableStatus,
    },
    /// Send a reminder to the table now
    Remind {
        id: String,
    },
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum DeviceAction {
    List,
    Add {
        code: String,
        name: String,
        #[arg(long)]
        gateway: String,
        #[arg(long)]
        table: Option<String>,
    },
    /// Link to a table, or unlink when no table is given
    Link {
        id: String,
        table: Option<String>,
    },
    Rename {
        id: String,
        name: String,
    },
    /// Tables a device can still be linked to
    Available {
        #[arg(long)]
        device: Option<String>,
    },
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum MessageAction {
    List,
    Add {
        content: String,
        /// greeting, reminder, promotion, farewell or custom
        #[arg(long, default_value = "custom")]
        kind: MessageKind,
    },
    /// Turn a message on or off
    Toggle {
        id: String,
    },
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ReminderAction {
    List {
        /// scheduled, sent, failed or cancelled
        #[arg(long)]
        status: Option<ReminderStatus>,
    },
    Add {
        #[arg(long)]
        table: String,
        #[arg(long)]
        device: String,
        message: String,
        /// RFC 3339 time; sends as a manual reminder when omitted
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    Send {
        id: String,
    },
    Cancel {
        id: String,
    },
    Retry {
        id: String,
    },
    Remove {
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "khachvui=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    let json = cli.format == "json";

    match cli.command {
        Commands::Register {
            first_name,
            last_name,
            email,
            phone,
            business,
            business_type,
            password,
            confirm_password,
            notes,
            terms,
            newsletter,
        } => {
            let form = RegistrationForm {
                first_name,
                last_name,
                email,
                phone,
                business,
                business_type,
                password,
                confirm_password,
                notes,
                terms,
                newsletter,
            };
            let user = auth_flow(&config)?.register(&form).await?;
            println!("{}", REGISTERED_MESSAGE);
            println!("  ID: {}", user.id);
        }

        Commands::Login { email, password } => {
            let session = auth_flow(&config)?.login(&LoginForm::new(email, password)).await?;
            SessionFile::save(&session)?;
            println!("Đăng nhập thành công!");
            println!("  {}", session.user.email.as_deref().unwrap_or(&session.user.id));
        }

        Commands::Logout => {
            if let Some(session) = SessionFile::load()? {
                if let Err(e) = auth_flow(&config)?.sign_out(&session.access_token).await {
                    tracing::warn!(error = %e, "Sign-out request failed");
                }
            }
            SessionFile::clear()?;
            println!("Đã đăng xuất.");
        }

        Commands::Whoami => {
            let session = require_session()?;
            let user = auth_flow(&config)?.current_user(&session.access_token).await?;
            emit(json, &user, || {
                println!("ID:    {}", user.id);
                println!("Email: {}", user.email.as_deref().unwrap_or("-"));
            })?;
        }

        Commands::Overview => {
            let (session, ctx) = signed_in(&config)?;
            let stats = ctx.overview(&session.user.id).await?;
            emit(json, &stats, || {
                println!("Cửa hàng:   {}", stats.shops);
                println!("Bàn:        {}", stats.tables);
                println!("Thiết bị:   {} ({} hoạt động)", stats.devices, stats.active_devices);
                println!("Gateway:    {} ({} trực tuyến)", stats.gateways, stats.gateways_online);
            })?;
        }

        Commands::Shops { action } => {
            let (session, ctx) = signed_in(&config)?;
            let mut page = ctx.shops(session.user.id.clone());
            page.refresh().await?;

            match action {
                ShopAction::List => {
                    emit(json, &page.shops(), || {
                        if page.shops().is_empty() {
                            println!("Chưa có cửa hàng nào.");
                            println!();
                            println!("Create your first shop with:");
                            println!("  khachvui-cli shops add \"Café A\" --address \"1 Main St\"");
                            return;
                        }
                        println!("{:<38} {:<24} {:<14} {}", "ID", "Name", "Phone", "Reminder");
                        println!("{}", "-".repeat(90));
                        for shop in page.shops() {
                            println!(
                                "{:<38} {:<24} {:<14} {}",
                                shop.id,
                                shop.name,
                                shop.phone.as_deref().unwrap_or("-"),
                                shop.reminder_label()
                            );
                        }
                    })?;
                }
                ShopAction::Add {
                    name,
                    address,
                    phone,
                    email,
                    reminder_time,
                    reminder_unit,
                } => {
                    let mut form = NewShop::new(session.user.id.clone(), name)
                        .reminder(reminder_time, reminder_unit);
                    form.address = address;
                    form.phone = phone;
                    form.email = email;

                    let shop = page.create(form).await?;
                    emit(json, &shop, || println!("Created shop {} ({})", shop.name, shop.id))?;
                }
                ShopAction::Update {
                    id,
                    name,
                    address,
                    phone,
                    email,
                    reminder_time,
                    reminder_unit,
                } => {
                    let patch = ShopPatch {
                        name,
                        address,
                        phone,
                        email,
                        reminder_time,
                        reminder_unit,
                    };
                    let shop = page.update(&id, patch).await?;
                    emit(json, &shop, || println!("Updated shop {}", shop.name))?;
                }
                ShopAction::Remove { id } => {
                    page.delete(&id).await?;
                    println!("Removed shop {}", id);
                }
            }
        }

        Commands::Gateways { shop_id, action } => {
            let (_, ctx) = signed_in(&config)?;
            let mut page = ctx.gateways(shop_id.clone());
            page.refresh().await?;

            match action {
                GatewayAction::List => {
                    emit(json, &page.gateways(), || {
                        println!("{} gateways, {} online", page.gateways().len(), page.online_count());
                        println!();
                        for gateway in page.gateways() {
                            println!(
                                "{:<38} {:<20} {:<16} {:<10} {} devices",
                                gateway.id,
                                gateway.name,
                                gateway.server_ip,
                                gateway.status.label(),
                                gateway.connected_devices
                            );
                        }
                    })?;
                }
                GatewayAction::Add { name, server_ip } => {
                    let gateway = page.create(NewGateway::new(shop_id, name, server_ip)).await?;
                    emit(json, &gateway, || {
                        println!("Created gateway {} ({})", gateway.name, gateway.id);
                        println!("  Push channel: {}", gateway.websocket_url());
                    })?;
                }
                GatewayAction::Remove { id } => {
                    page.delete(&id).await?;
                    println!("Removed gateway {}", id);
                }
            }
        }

        Commands::Tables { shop_id, action } => {
            let (_, ctx) = signed_in(&config)?;
            let mut page = ctx.tables(shop_id.clone());
            page.refresh().await?;

            match action {
                TableAction::List => {
                    emit(json, &page.tables(), || {
                        let counts = page.counts();
                        println!(
                            "{} tables: {} empty, {} occupied, {} reserved",
                            counts.total, counts.empty, counts.occupied, counts.reserved
                        );
                        println!();
                        for table in page.tables() {
                            println!(
                                "{:<38} Bàn {:<6} {:<12} {}",
                                table.id,
                                table.number,
                                table.status.label(),
                                table
                                    .last_reminder
                                    .map(|t| format_time(&t))
                                    .unwrap_or_else(|| "-".to_string())
                            );
                        }
                    })?;
                }
                TableAction::Add { number, details } => {
                    let mut form = NewDiningTable::new(shop_id, number);
                    form.details = details;
                    let table = page.create(form).await?;
                    emit(json, &table, || println!("Created table {} ({})", table.number, table.id))?;
                }
                TableAction::Status { id, status } => {
                    let table = page.set_status(&id, status).await?;
                    emit(json, &table, || {
                        println!("Bàn {}: {}", table.number, table.status.label())
                    })?;
                }
                TableAction::Remind { id } => {
                    let notification = page.send_reminder(&id).await?;
                    emit(json, &notification, || println!("{}", notification.message))?;
                }
                TableAction::Remove { id } => {
                    page.delete(&id).await?;
                    println!("Removed table {}", id);
                }
            }
        }

        Commands::Devices { shop_id, action } => {
            let (_, ctx) = signed_in(&config)?;
            let mut page = ctx.devices(shop_id.clone());
            page.refresh().await?;

            match action {
                DeviceAction::List => {
                    let rows = page.rows();
                    emit(json, &rows, || {
                        let stats = page.stats();
                        println!(
                            "{} devices: {} online, {} offline, {} low battery, {} linked",
                            stats.total, stats.online, stats.offline, stats.low_battery, stats.linked
                        );
                        println!();
                        for row in &rows {
                            println!(
                                "{:<38} {:<10} {:<20} {:<12} {:>3}%  gateway {:<16} table {}",
                                row.device.id,
                                row.device.code,
                                row.device.name,
                                row.device.status.label(),
                                row.device.battery_level,
                                row.gateway_name.as_deref().unwrap_or("-"),
                                row.table_number.as_deref().unwrap_or("-")
                            );
                        }
                    })?;
                }
                DeviceAction::Add {
                    code,
                    name,
                    gateway,
                    table,
                } => {
                    let mut form = NewDevice::new(shop_id, gateway, code, name);
                    form.table_id = table;
                    let row = page.create(form).await?;
                    emit(json, &row, || {
                        println!("Created device {} ({})", row.device.name, row.device.id)
                    })?;
                }
                DeviceAction::Link { id, table } => {
                    let row = page.link(&id, table.as_deref()).await?;
                    emit(json, &row, || match &row.table_number {
                        Some(number) => println!("{} linked to table {}", row.device.name, number),
                        None => println!("{} unlinked", row.device.name),
                    })?;
                }
                DeviceAction::Rename { id, name } => {
                    let patch = DevicePatch {
                        name: Some(name),
                        ..Default::default()
                    };
                    let row = page.update(&id, patch).await?;
                    emit(json, &row, || println!("Renamed device to {}", row.device.name))?;
                }
                DeviceAction::Available { device } => {
                    let tables = page.available_tables(device.as_deref());
                    emit(json, &tables, || {
                        for table in &tables {
                            println!("{:<38} Bàn {}", table.id, table.number);
                        }
                    })?;
                }
                DeviceAction::Remove { id } => {
                    page.delete(&id).await?;
                    println!("Removed device {}", id);
                }
            }
        }

        Commands::Messages { device_id, action } => {
            let (_, ctx) = signed_in(&config)?;
            let mut page = ctx.messages(device_id);
            page.refresh().await?;

            match action {
                MessageAction::List => {
                    emit(json, &page.messages(), || {
                        for message in page.messages() {
                            println!(
                                "{:<38} {:<3} {:<10} {}",
                                message.id,
                                if message.is_active { "on" } else { "off" },
                                message.kind.label(),
                                message.content
                            );
                        }
                    })?;
                }
                MessageAction::Add { content, kind } => {
                    let message = page.add(&content, kind).await?;
                    emit(json, &message, || println!("Added message {}", message.id))?;
                }
                MessageAction::Toggle { id } => {
                    let message = page.toggle(&id).await?;
                    emit(json, &message, || {
                        println!(
                            "Message {} is now {}",
                            message.id,
                            if message.is_active { "on" } else { "off" }
                        )
                    })?;
                }
                MessageAction::Remove { id } => {
                    page.delete(&id).await?;
                    println!("Removed message {}", id);
                }
            }
        }

        Commands::Reminders { shop_id, action } => {
            let (_, ctx) = signed_in(&config)?;
            let mut page = ctx.reminders(shop_id);
            page.refresh().await?;

            match action {
                ReminderAction::List { status } => {
                    page.set_filter(status);
                    let visible = page.visible();
                    emit(json, &visible, || {
                        let counts = page.counts();
                        println!(
                            "{} reminders: {} sent, {} scheduled, {} failed",
                            counts.total, counts.sent, counts.scheduled, counts.failed
                        );
                        println!();
                        for reminder in &visible {
                            println!(
                                "{:<38} Bàn {:<6} {:<10} {:<18} {}",
                                reminder.id,
                                page.table_number(&reminder.table_id),
                                reminder.status.label(),
                                format_time(&reminder.scheduled_time),
                                reminder.message
                            );
                        }
                    })?;
                }
                ReminderAction::Add {
                    table,
                    device,
                    message,
                    at,
                } => {
                    let reminder = page.create(&table, &device, &message, at).await?;
                    emit(json, &reminder, || {
                        println!(
                            "Reminder {} for table {} at {}",
                            reminder.id,
                            page.table_number(&reminder.table_id),
                            format_time(&reminder.scheduled_time)
                        )
                    })?;
                }
                ReminderAction::Send { id } => {
                    let (_, notification) = page.send(&id).await?;
                    emit(json, &notification, || println!("{}", notification.message))?;
                }
                ReminderAction::Cancel { id } => {
                    let reminder = page.cancel(&id).await?;
                    emit(json, &reminder, || println!("Reminder {} cancelled", reminder.id))?;
                }
                ReminderAction::Retry { id } => {
                    let reminder = page.retry(&id).await?;
                    emit(json, &reminder, || println!("Reminder {} rescheduled", reminder.id))?;
                }
                ReminderAction::Remove { id } => {
                    page.delete(&id).await?;
                    println!("Removed reminder {}", id);
                }
            }
        }

        Commands::Listen { url } => {
            let mut push_config = match url {
                Some(url) => PushConfig::new(url),
                None => config
                    .push
                    .push_config()
                    .context("No push channel configured (set KHACHVUI_PUSH_URL or pass --url)")?,
            };
            push_config.reconnect_interval = std::time::Duration::from_secs(
                config.push.reconnect_interval_secs,
            );
            push_config.reconnect_attempts = config.push.reconnect_attempts;

            listen(push_config, config.notifications.terminal_bell, json).await?;
        }

        Commands::Config { output } => {
            let template = khachvui::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &template)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", template);
                }
            }
        }
    }

    Ok(())
}

async fn listen(
    push_config: PushConfig,
    bell: bool,
    json: bool,
) -> anyhow::Result<()> {
    let chime: Arc<dyn Chime> = if bell {
        Arc::new(TerminalBell)
    } else {
        Arc::new(SilentChime)
    };
    let notifications = Arc::new(NotificationStore::new(chime));
    let mut events = notifications.subscribe();

    eprintln!("Listening on {} (Ctrl+C to stop)", push_config.url);
    let push = PushHandle::connect(push_config, Arc::new(WsConnector));
    let feed = notifications.spawn_feed(push.subscribe());
    let mut connected = push.watch_connected();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = push.stopped() => {
                eprintln!("Gave up reconnecting");
                break;
            }
            changed = connected.changed() => {
                if changed.is_err() {
                    break;
                }
                let up = *connected.borrow_and_update();
                eprintln!("{}", if up { "Đã kết nối" } else { "Mất kết nối" });
            }
            event = events.recv() => match event {
                Ok(NotificationEvent::Added { notification }) => {
                    emit(json, &notification, || {
                        println!(
                            "[{}] {}: {}",
                            format_time(&notification.time),
                            notification.title,
                            notification.message
                        )
                    })?;
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Listener lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    push.disconnect().await;
    feed.abort();
    Ok(())
}

/// Session token kept between invocations
struct SessionFile;

impl SessionFile {
    fn path() -> anyhow::Result<PathBuf> {
        let dir = dirs::config_dir().context("No config directory on this system")?;
        Ok(dir.join("khachvui").join("session.json"))
    }

    fn load() -> anyhow::Result<Option<Session>> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let session = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt session file {:?}; run `khachvui-cli logout`", path))?;
        Ok(Some(session))
    }

    fn save(session: &Session) -> anyhow::Result<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(session)?)?;
        Ok(())
    }

    fn clear() -> anyhow::Result<()> {
        let path = Self::path()?;
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}

fn require_session() -> anyhow::Result<Session> {
    match SessionFile::load()? {
        Some(session) => Ok(session),
        None => bail!("Vui lòng đăng nhập để tiếp tục. Run `khachvui-cli login`."),
    }
}

fn auth_flow(config: &Config) -> anyhow::Result<AuthFlow> {
    let identity = GoTrueClient::new(&config.store.rest_config())?;
    let profile_config = config
        .store
        .service_rest_config()
        .unwrap_or_else(|| config.store.rest_config());
    let profiles: Arc<dyn RecordStore> = Arc::new(RestStore::new(profile_config)?);
    Ok(AuthFlow::new(Arc::new(identity), Repository::new(profiles)))
}

/// Pages acting as the saved session's user
fn signed_in(config: &Config) -> anyhow::Result<(Session, DashboardContext)> {
    let session = require_session()?;
    let store = RestStore::new(config.store.rest_config())?.with_access_token(&session.access_token);
    let notifications = Arc::new(NotificationStore::new(Arc::new(SilentChime)));
    let ctx = DashboardContext::new(Arc::new(store), notifications);
    Ok((session, ctx))
}

fn emit<T: Serialize + ?Sized>(json: bool, value: &T, table: impl FnOnce()) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        table();
    }
    Ok(())
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.with_timezone(&chrono::Local)
        .format("%d/%m/%Y %H:%M")
        .to_string()
}
