//! Student-records bootstrap.
//!
//! Declares the service graph once at startup, validates it, serves a few
//! requests and disposes the database pool on shutdown.
//!
//! Run with: `cargo run --example student_records`

use roster_di::{Container, ContainerConfig, DiResult, Dispose, LoggingObserver, MetricsObserver, Resolver};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

struct AppConfig {
    database_url: String,
    environment: String,
}

struct Logger {
    environment: String,
}

impl Logger {
    fn info(&self, message: &str) {
        tracing::info!(env = %self.environment, "{}", message);
    }
}

struct DatabasePool {
    url: String,
}

impl Dispose for DatabasePool {
    fn dispose(&self) {
        tracing::info!(url = %self.url, "closing database pool");
    }
}

#[derive(Clone, Debug)]
struct Student {
    id: u32,
    name: String,
}

struct StudentRepository {
    _pool: Arc<DatabasePool>,
    rows: Mutex<BTreeMap<u32, Student>>,
}

struct StudentService {
    repository: Arc<StudentRepository>,
    logger: Arc<Logger>,
}

impl StudentService {
    fn create(&self, id: u32, name: &str) -> Student {
        let student = Student { id, name: name.to_string() };
        if let Ok(mut rows) = self.repository.rows.lock() {
            rows.insert(id, student.clone());
        }
        self.logger.info(&format!("created student {}", id));
        student
    }

    fn list(&self) -> Vec<Student> {
        self.repository.rows.lock().map(|rows| rows.values().cloned().collect()).unwrap_or_default()
    }
}

struct StudentController {
    service: Arc<StudentService>,
}

fn register_services(container: &Container) -> DiResult<()> {
    container
        .add_value(
            "config",
            AppConfig {
                database_url: "postgres://localhost/roster".to_string(),
                environment: "development".to_string(),
            },
        )?
        .add_singleton("logger", &["config"], |deps| {
            Ok(Logger { environment: deps.get::<AppConfig>(0)?.environment.clone() })
        })?
        .add_disposable_singleton("database", &["config"], |deps| {
            Ok(DatabasePool { url: deps.get::<AppConfig>(0)?.database_url.clone() })
        })?
        .add_singleton("studentRepository", &["database"], |deps| {
            Ok(StudentRepository { _pool: deps.get(0)?, rows: Mutex::new(BTreeMap::new()) })
        })?
        .add_singleton("studentService", &["studentRepository", "logger"], |deps| {
            Ok(StudentService { repository: deps.get(0)?, logger: deps.get(1)? })
        })?
        .add_transient("studentController", &["studentService"], |deps| {
            Ok(StudentController { service: deps.get(0)? })
        })?
        .add_factory("rosterCsv", &["studentService"], |deps| {
            let service = deps.get::<StudentService>(0)?;
            let lines: Vec<String> = service.list().iter().map(|s| format!("{},{}", s.id, s.name)).collect();
            Ok(lines.join("\n"))
        })?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let container = Container::with_config(ContainerConfig::from_env()?);
    let metrics = Arc::new(MetricsObserver::new());
    container
        .add_observer(Arc::new(LoggingObserver::with_label("student-records")))
        .add_observer(metrics.clone());

    register_services(&container)?;
    container.validate().ensure_valid()?;
    println!("{}", container.dependency_graph().to_dot());

    for (id, name) in [(1, "Ada Lovelace"), (2, "Grace Hopper"), (3, "Alan Turing")] {
        let controller = container.get::<StudentController>("studentController")?;
        controller.service.create(id, name);
    }

    let csv = container.get_factory::<String>("rosterCsv")?;
    println!("{}", csv);
    println!(
        "resolutions: {}, cache hits: {}, average: {:?}",
        metrics.resolution_count(),
        metrics.cache_hit_count(),
        metrics.average_resolution_time()
    );

    container.dispose_all();
    Ok(())
}
