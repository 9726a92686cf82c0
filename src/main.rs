use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::EnvFilter;

use meetroom_client::net::types::{AdminUserUpdate, BookingCreate, BookingUpdate, Role, RoomInput};
use meetroom_client::router::{ENTRY_ROUTE, GuardDecision, LANDING_ROUTE, resolve};
use meetroom_client::{App, ClientConfig, ClientError, ErrorCode};

#[derive(Parser, Debug)]
#[command(name = "meetroom", about = "Meeting-room booking client")]
struct Cli {
    /// API root, e.g. `https://rooms.example.com/api`.
    #[arg(long, env = "MEETROOM_API_BASE_URL")]
    base_url: Option<String>,

    /// File holding the persisted session.
    #[arg(long, env = "MEETROOM_STATE_FILE")]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        email: String,
        #[arg(long, env = "MEETROOM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long)]
        full_name: String,
        email: String,
        #[arg(long, env = "MEETROOM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Whoami,
    /// Change the display name.
    Profile {
        full_name: String,
    },
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
    Rooms(RoomsCommand),
    Bookings(BookingsCommand),
    Users(UsersCommand),
    /// Evaluate the navigation guard for a path against the saved session.
    Route {
        path: String,
    },
}

#[derive(Args, Debug)]
struct RoomsCommand {
    #[command(subcommand)]
    command: RoomsSubcommand,
}

#[derive(Subcommand, Debug)]
enum RoomsSubcommand {
    /// Active rooms.
    List,
    Available {
        #[arg(long, value_parser = parse_timestamp)]
        start: OffsetDateTime,
        #[arg(long, value_parser = parse_timestamp)]
        end: OffsetDateTime,
    },
    /// Every room with its next booking (admin).
    Admin,
    Show {
        id: i64,
    },
    Create(RoomArgs),
    Update {
        id: i64,
        #[command(flatten)]
        room: RoomArgs,
    },
}

#[derive(Args, Debug)]
struct RoomArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    capacity: u32,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    equipments: Option<String>,
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    active: bool,
}

impl From<RoomArgs> for RoomInput {
    fn from(args: RoomArgs) -> Self {
        Self {
            name: args.name,
            capacity: args.capacity,
            location: args.location,
            equipments_json: args.equipments,
            is_active: args.active,
        }
    }
}

#[derive(Args, Debug)]
struct BookingsCommand {
    #[command(subcommand)]
    command: BookingsSubcommand,
}

#[derive(Subcommand, Debug)]
enum BookingsSubcommand {
    Mine,
    /// Every booking, newest first (admin).
    All,
    Create {
        #[arg(long)]
        room: i64,
        #[command(flatten)]
        details: BookingArgs,
    },
    Update {
        id: i64,
        #[command(flatten)]
        details: BookingArgs,
    },
    Cancel {
        id: i64,
    },
}

#[derive(Args, Debug)]
struct BookingArgs {
    #[arg(long)]
    title: String,
    #[arg(long, value_parser = parse_timestamp)]
    start: OffsetDateTime,
    #[arg(long, value_parser = parse_timestamp)]
    end: OffsetDateTime,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List,
    Show {
        id: i64,
    },
    Update {
        id: i64,
        #[arg(long, value_enum)]
        role: RoleArg,
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Admin,
    Member,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Self::Admin,
            RoleArg::Member => Self::Member,
        }
    }
}

fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(raw, &Rfc3339).map_err(|e| format!("expected RFC 3339 timestamp: {e}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error[{}]: {e}", e.error_code());
            if e.retryable() {
                eprintln!("the request may succeed if retried");
            }
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig, ClientError> {
    let defaults = ClientConfig::from_env()?;
    if cli.base_url.is_none() && cli.state_file.is_none() {
        return Ok(defaults);
    }
    let base_url = cli.base_url.clone().unwrap_or(defaults.api_base_url);
    let state_file = cli.state_file.clone().unwrap_or(defaults.state_file);
    Ok(ClientConfig::new(base_url, state_file)?.with_timeouts(defaults.timeouts))
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    let config = load_config(&cli)?;
    let app = App::from_config(&config)?;

    match cli.command {
        Command::Login { email, password } => print_json(&app.session.login(&email, &password).await?),
        Command::Register { full_name, email, password } => {
            print_json(&app.session.register(&full_name, &email, &password).await?)
        }
        Command::Logout => {
            app.logout().await;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => {
            let user = app.context().user().await.ok_or(ClientError::NotAuthenticated)?;
            print_json(&user)
        }
        Command::Profile { full_name } => print_json(&app.session.update_profile(&full_name).await?),
        Command::Password { current, new } => {
            app.session.change_password(&current, &new).await?;
            println!("password changed");
            Ok(())
        }
        Command::Rooms(rooms) => run_rooms(&app, rooms.command).await,
        Command::Bookings(bookings) => run_bookings(&app, bookings.command).await,
        Command::Users(users) => run_users(&app, users.command).await,
        Command::Route { path } => {
            let route = resolve(&path);
            let decision = match app.router.check(&path).await {
                GuardDecision::Proceed => json!({ "decision": "proceed" }),
                GuardDecision::RedirectToEntry { return_to } => {
                    json!({ "decision": "redirect", "to": ENTRY_ROUTE.path(), "returnTo": return_to })
                }
                GuardDecision::RedirectToLanding => json!({ "decision": "redirect", "to": LANDING_ROUTE.path() }),
            };
            print_json(&json!({ "route": format!("{:?}", route.name), "guard": decision }))
        }
    }
}

async fn run_rooms(app: &App, command: RoomsSubcommand) -> Result<(), ClientError> {
    match command {
        RoomsSubcommand::List => print_json(&app.rooms.fetch_all_rooms().await?),
        RoomsSubcommand::Available { start, end } => print_json(&app.rooms.fetch_available_rooms(start, end).await?),
        RoomsSubcommand::Admin => print_json(&app.rooms.fetch_admin_rooms().await?),
        RoomsSubcommand::Show { id } => print_json(&app.rooms.fetch_room(id).await?),
        RoomsSubcommand::Create(args) => print_json(&app.rooms.create_room(args.into()).await?),
        RoomsSubcommand::Update { id, room } => print_json(&app.rooms.update_room(id, room.into()).await?),
    }
}

async fn run_bookings(app: &App, command: BookingsSubcommand) -> Result<(), ClientError> {
    match command {
        BookingsSubcommand::Mine => print_json(&app.bookings.fetch_my_bookings().await?),
        BookingsSubcommand::All => print_json(&app.bookings.fetch_all_bookings().await?),
        BookingsSubcommand::Create { room, details } => {
            let booking = BookingCreate {
                room_id: room,
                title: details.title,
                start_at: details.start,
                end_at: details.end,
                notes: details.notes,
            };
            print_json(&app.bookings.create_booking(booking).await?)
        }
        BookingsSubcommand::Update { id, details } => {
            let update = BookingUpdate {
                title: details.title,
                start_at: details.start,
                end_at: details.end,
                notes: details.notes,
            };
            print_json(&app.bookings.update_booking(id, update).await?)
        }
        BookingsSubcommand::Cancel { id } => {
            app.bookings.cancel_booking(id).await?;
            println!("booking {id} cancelled");
            Ok(())
        }
    }
}

async fn run_users(app: &App, command: UsersSubcommand) -> Result<(), ClientError> {
    match command {
        UsersSubcommand::List => print_json(&app.users.fetch_all_users().await?),
        UsersSubcommand::Show { id } => print_json(&app.users.fetch_user(id).await?),
        UsersSubcommand::Update { id, role, active } => {
            let update = AdminUserUpdate { role: role.into(), is_active: active };
            print_json(&app.users.update_user(id, update).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ClientError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
