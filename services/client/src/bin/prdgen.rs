//! services/client/src/bin/prdgen.rs

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use prd_client_core::domain::{FilterState, Route, SortOrder, TemplateType, View};
use prd_client_core::ports::PrdService;
use prdgen_lib::{
    adapters::{DirectorySink, FileStore, HttpGateway, Osc52Clipboard, TerminalUi},
    config::{AuthMode, Config},
    controllers::{
        AuthController, DocumentList, DocumentViewer, GeneratePage, GenerationForm, LoginPage,
        RegisterPage, RegistrationForm,
    },
    error::{ClientError, ClientResult},
    session::SessionStore,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "prdgen", version, about = "Generate and manage Product Requirements Documents")]
struct Cli {
    /// Answer yes to confirmation prompts.
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PRDGEN_PASSWORD", hide_env_values = true)]
        password: String,
        /// View to continue to after signing in.
        #[arg(long)]
        then: Option<View>,
    },
    /// Create an account, then sign in with it.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PRDGEN_PASSWORD", hide_env_values = true)]
        password: String,
        /// Defaults to the password.
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Generate a new PRD.
    Generate(GenerateArgs),
    /// List stored PRDs.
    List(ListArgs),
    /// Print a PRD.
    View { id: String },
    /// Save a PRD to the export directory.
    Export { id: String },
    /// Copy a PRD's content to the clipboard.
    Copy { id: String },
    /// Delete a PRD.
    Delete { id: String },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    prompt: String,
    /// crud_application, ai_agent, saas_platform or custom.
    #[arg(long, default_value = "crud_application")]
    template: String,
    /// markdown, json or text.
    #[arg(long, default_value = "markdown")]
    format: String,
    /// Also save the result to the export directory.
    #[arg(long)]
    export: bool,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long)]
    template: Option<TemplateType>,
    /// newest, oldest or title.
    #[arg(long, default_value = "newest")]
    sort: SortOrder,
    #[arg(long, default_value_t = 1)]
    page: usize,
}

impl Command {
    fn view(&self) -> View {
        match self {
            Command::Login { .. } => View::Login,
            Command::Register { .. } => View::Register,
            Command::Logout => View::Home,
            Command::Whoami => View::Profile,
            Command::Generate(_) => View::Generate,
            Command::List(_)
            | Command::View { .. }
            | Command::Export { .. }
            | Command::Copy { .. }
            | Command::Delete { .. } => View::History,
        }
    }
}

/// Everything a command needs, wired once at startup.
struct App {
    config: Config,
    api: Arc<dyn PrdService>,
    auth: Arc<AuthController>,
    ui: Arc<TerminalUi>,
}

impl App {
    fn viewer(&self) -> DocumentViewer {
        DocumentViewer::new(
            self.ui.clone(),
            Arc::new(Osc52Clipboard),
            Arc::new(DirectorySink::new(&self.config.export_dir)),
            self.config.copy_feedback,
        )
    }

    async fn open_document(&self, id: &str) -> ClientResult<DocumentViewer> {
        let doc = match self.api.get_document(id).await {
            Ok(doc) => doc,
            Err(e) => {
                let err = ClientError::from(e);
                self.auth.intercept(&err, View::History).await;
                return Err(err);
            }
        };
        let mut viewer = self.viewer();
        viewer.show(doc);
        Ok(viewer)
    }

    async fn run(&self, command: Command) -> ClientResult<()> {
        let view = command.view();
        if !self.auth.enter(view) {
            return Ok(());
        }

        match command {
            Command::Login {
                email,
                password,
                then,
            } => {
                let route = Route {
                    redirect: then,
                    ..Route::to(View::Login)
                };
                let page = LoginPage::new(
                    self.auth.clone(),
                    self.ui.clone(),
                    self.ui.clone(),
                    route,
                );
                if page.open() {
                    page.submit(&email, &password).await?;
                }
            }
            Command::Register {
                name,
                email,
                password,
                confirm,
            } => {
                let form = RegistrationForm {
                    full_name: name,
                    email,
                    confirm_password: confirm.unwrap_or_else(|| password.clone()),
                    password,
                };
                let page = RegisterPage::new(self.auth.clone(), self.ui.clone(), self.ui.clone());
                let outcome = page.submit(&form).await?;
                info!("Registration finished: {:?}", outcome);
            }
            Command::Logout => self.auth.logout().await,
            Command::Whoami => match self.auth.state().await.user() {
                Some(user) => println!("{} <{}>", user.display_name(), user.email),
                None => println!("No profile is stored."),
            },
            Command::Generate(args) => {
                let mut page = GeneratePage::new(
                    self.api.clone(),
                    self.auth.clone(),
                    self.ui.clone(),
                    self.viewer(),
                );
                page.submit(&GenerationForm {
                    title: args.title,
                    input_prompt: args.prompt,
                    template_type: args.template,
                    format: args.format,
                })
                .await?;
                if args.export {
                    page.viewer().download()?;
                }
            }
            Command::List(args) => {
                let mut list = self.document_list();
                list.open(
                    FilterState {
                        search: args.search,
                        template: args.template,
                        sort: args.sort,
                    },
                    args.page,
                )
                .await?;
            }
            Command::View { id } => {
                self.open_document(&id).await?;
            }
            Command::Export { id } => {
                let viewer = self.open_document(&id).await?;
                if let Some(file) = viewer.download()? {
                    println!("Saved {}", file.filename);
                }
            }
            Command::Copy { id } => {
                let viewer = self.open_document(&id).await?;
                viewer.copy().await;
            }
            Command::Delete { id } => {
                let mut list = self.document_list();
                if !list.delete(&id).await? {
                    println!("Cancelled.");
                }
            }
        }
        Ok(())
    }

    fn document_list(&self) -> DocumentList {
        DocumentList::new(
            self.api.clone(),
            self.auth.clone(),
            self.ui.clone(),
            self.config.paging_mode,
            self.config.page_size,
        )
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match start(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn start(cli: Cli) -> ClientResult<()> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    if config.auth_mode == AuthMode::Disabled {
        warn!("Authentication is disabled; requests are sent without credentials");
    }

    // --- 2. Build the Session and the Gateway ---
    let store = Arc::new(FileStore::new(&config.state_file));
    let session = SessionStore::new(store, config.auth_mode);
    let gateway = HttpGateway::new(config.api_url.clone(), session.clone())
        .map_err(ClientError::from)?;
    let api: Arc<dyn PrdService> = Arc::new(gateway);
    info!("Using backend at {}", config.api_url);

    // --- 3. Wire the Controllers ---
    let ui = Arc::new(TerminalUi::new(cli.yes));
    let auth = Arc::new(AuthController::new(
        api.clone(),
        session,
        ui.clone(),
        ui.clone(),
    ));
    auth.init().await;

    let app = App {
        config,
        api,
        auth: auth.clone(),
        ui,
    };

    // --- 4. Verify the Stored Token Alongside the Command ---
    let (_, result) = tokio::join!(auth.verify(), app.run(cli.command));
    result
}
