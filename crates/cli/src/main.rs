use caps_core::config::{data_dir_from_env_value, load_facility, store_kind_from_env_value};
use caps_core::constants::{DATA_DIR_ENV, FACILITY_FILE_ENV, STORE_ENV};
use caps_core::{
    AttendanceService, CapsError, CoreConfig, DashboardService, ExportService, PatientService,
    ProcedureService, ProfessionalService, Registry,
};
use caps_types::{
    Address, AttendanceActionDetails, AttendanceDetails, Contact, NonEmptyText,
    PatientDestination, PatientDetails, PatientOrigin, ProcedureDetails, ProfessionalDetails,
    RaceColor, RecordId, Sex, YesNo,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "caps")]
#[command(about = "CAPS registry and RAAS export CLI")]
struct Cli {
    /// Registry data directory (falls back to CAPS_DATA_DIR, then `caps_data`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Facility identity YAML (falls back to CAPS_FACILITY_FILE, then built-in defaults)
    #[arg(long, global = true)]
    facility_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patients
    ListPatients,
    /// Register a patient (a CNS or a CPF is required)
    AddPatient {
        /// Full name
        name: String,
        /// Date of birth (YYYY-MM-DD)
        birth_date: NaiveDate,
        /// Sex code: M or F
        sex: Sex,
        #[arg(long)]
        cns: Option<String>,
        #[arg(long)]
        cpf: Option<String>,
        /// Race/color code (01-05)
        #[arg(long, default_value = "03")]
        race_color: RaceColor,
        #[arg(long)]
        medical_record: Option<String>,
        #[arg(long)]
        mother_name: Option<String>,
        #[arg(long)]
        responsible_name: Option<String>,
        #[arg(long)]
        street: Option<String>,
        #[arg(long)]
        number: Option<String>,
        #[arg(long)]
        complement: Option<String>,
        #[arg(long)]
        neighborhood: Option<String>,
        #[arg(long)]
        zipcode: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        mobile: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Register a professional
    AddProfessional {
        name: NonEmptyText,
        /// CBO occupation code
        cbo_code: NonEmptyText,
        /// CBO occupation description
        cbo_description: NonEmptyText,
        #[arg(long)]
        cns: Option<String>,
        #[arg(long)]
        cpf: Option<String>,
    },
    /// List professionals
    ListProfessionals {
        #[arg(long)]
        active_only: bool,
    },
    /// Register a SIGTAP procedure
    AddProcedure {
        sigtap_code: NonEmptyText,
        description: NonEmptyText,
        #[arg(long)]
        procedure_type: Option<String>,
    },
    /// List procedures
    ListProcedures {
        #[arg(long)]
        active_only: bool,
    },
    /// Open an attendance for a patient
    AddAttendance {
        patient_id: RecordId,
        /// Admission date (YYYY-MM-DD)
        admission_date: NaiveDate,
        /// Primary CID-10 code
        cid_primary: NonEmptyText,
        /// Secondary CID-10 code (repeat up to three times)
        #[arg(long = "cid-secondary")]
        cid_secondary: Vec<String>,
        /// Origin code (01-06)
        #[arg(long, default_value = "01")]
        origin: PatientOrigin,
        /// Destination code (00-04)
        #[arg(long, default_value = "00")]
        destination: PatientDestination,
        /// Patient is covered by a family-health (ESF) team
        #[arg(long)]
        esf_coverage: bool,
        /// CNES of the covering family-health team; implies --esf-coverage
        #[arg(long)]
        esf_cnes: Option<String>,
        #[arg(long)]
        homeless: bool,
        /// Patient uses alcohol or other substances
        #[arg(long)]
        substance_use: bool,
        /// Substance type; implies --substance-use
        #[arg(long)]
        substance_type: Option<String>,
    },
    /// List attendances, newest admission first
    ListAttendances,
    /// Record an action under an attendance
    AddAction {
        attendance_id: RecordId,
        professional_id: RecordId,
        procedure_id: RecordId,
        /// Action date (YYYY-MM-DD)
        action_date: NaiveDate,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List the actions of an attendance
    ListActions { attendance_id: RecordId },
    /// Show registry totals
    Stats,
    /// Write the RAAS production file
    Export {
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Generation date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

struct Services {
    patients: PatientService,
    professionals: ProfessionalService,
    procedures: ProcedureService,
    attendances: AttendanceService,
    dashboard: DashboardService,
    export: ExportService,
}

/// A S/N answer whose follow-up detail, when given, implies `S`.
fn yes_no_with_detail(flag: bool, detail: &Option<String>) -> YesNo {
    YesNo::from(flag || detail.is_some())
}

fn open_services(cli: &Cli) -> Result<Services, Box<dyn std::error::Error>> {
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| data_dir_from_env_value(std::env::var(DATA_DIR_ENV).ok()));
    let facility_file = cli
        .facility_file
        .clone()
        .or_else(|| std::env::var(FACILITY_FILE_ENV).ok().map(PathBuf::from));
    let store_kind = store_kind_from_env_value(std::env::var(STORE_ENV).ok())?;

    let facility = load_facility(facility_file.as_deref())?;
    let cfg = Arc::new(CoreConfig::new(data_dir, facility, store_kind)?);
    let registry = Arc::new(Registry::open(&cfg)?);

    Ok(Services {
        patients: PatientService::new(registry.clone()),
        professionals: ProfessionalService::new(registry.clone()),
        procedures: ProcedureService::new(registry.clone()),
        attendances: AttendanceService::new(registry.clone()),
        dashboard: DashboardService::new(registry.clone()),
        export: ExportService::new(cfg, registry),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command.as_ref() else {
        println!("Use 'caps --help' for commands");
        return Ok(());
    };
    let services = open_services(&cli)?;

    match command {
        Commands::ListPatients => {
            let patients = services.patients.list()?;
            if patients.is_empty() {
                println!("No patients found.");
            }
            for p in patients {
                println!(
                    "ID: {}, Name: {}, Document: {}, Born: {}",
                    p.id,
                    p.details.name,
                    p.details.identity_document().unwrap_or("-"),
                    p.details.birth_date
                );
            }
        }
        Commands::AddPatient {
            name,
            birth_date,
            sex,
            cns,
            cpf,
            race_color,
            medical_record,
            mother_name,
            responsible_name,
            street,
            number,
            complement,
            neighborhood,
            zipcode,
            phone,
            mobile,
            email,
        } => {
            let details = PatientDetails {
                medical_record: medical_record.clone(),
                cns: cns.clone(),
                cpf: cpf.clone(),
                name: NonEmptyText::new(name)?,
                birth_date: *birth_date,
                sex: *sex,
                race_color: *race_color,
                mother_name: mother_name.clone(),
                responsible_name: responsible_name.clone(),
                address: Address {
                    street: street.clone(),
                    number: number.clone(),
                    complement: complement.clone(),
                    neighborhood: neighborhood.clone(),
                    zipcode: zipcode.clone(),
                },
                contact: Contact {
                    phone: phone.clone(),
                    mobile: mobile.clone(),
                    email: email.clone(),
                },
            };
            let patient = services.patients.create(details)?;
            println!("Created patient with ID: {}", patient.id);
        }
        Commands::AddProfessional {
            name,
            cbo_code,
            cbo_description,
            cns,
            cpf,
        } => {
            let professional = services.professionals.create(ProfessionalDetails {
                name: name.clone(),
                cbo_code: cbo_code.clone(),
                cbo_description: cbo_description.clone(),
                cns: cns.clone(),
                cpf: cpf.clone(),
                active: true,
            })?;
            println!("Created professional with ID: {}", professional.id);
        }
        Commands::ListProfessionals { active_only } => {
            for p in services.professionals.list(*active_only)? {
                println!(
                    "ID: {}, Name: {}, CBO: {} ({}), Active: {}",
                    p.id,
                    p.details.name,
                    p.details.cbo_code,
                    p.details.cbo_description,
                    p.details.active
                );
            }
        }
        Commands::AddProcedure {
            sigtap_code,
            description,
            procedure_type,
        } => {
            let procedure = services.procedures.create(ProcedureDetails {
                sigtap_code: sigtap_code.clone(),
                description: description.clone(),
                procedure_type: procedure_type.clone(),
                active: true,
            })?;
            println!("Created procedure with ID: {}", procedure.id);
        }
        Commands::ListProcedures { active_only } => {
            for p in services.procedures.list(*active_only)? {
                println!(
                    "ID: {}, SIGTAP: {}, Description: {}, Active: {}",
                    p.id, p.details.sigtap_code, p.details.description, p.details.active
                );
            }
        }
        Commands::AddAttendance {
            patient_id,
            admission_date,
            cid_primary,
            cid_secondary,
            origin,
            destination,
            esf_coverage,
            esf_cnes,
            homeless,
            substance_use,
            substance_type,
        } => {
            let attendance = services.attendances.create(AttendanceDetails {
                patient_id: *patient_id,
                admission_date: *admission_date,
                origin: *origin,
                cid_primary: cid_primary.clone(),
                cid_secondary: cid_secondary.clone(),
                esf_coverage: yes_no_with_detail(*esf_coverage, esf_cnes),
                esf_cnes: esf_cnes.clone(),
                destination: *destination,
                homeless: YesNo::from(*homeless),
                substance_use: yes_no_with_detail(*substance_use, substance_type),
                substance_type: substance_type.clone(),
            })?;
            println!(
                "Created attendance with ID: {} (month {})",
                attendance.id, attendance.month_reference
            );
        }
        Commands::ListAttendances => {
            for a in services.attendances.list()? {
                println!(
                    "ID: {}, Patient: {}, Admission: {}, CID: {}, Month: {}",
                    a.id,
                    a.details.patient_id,
                    a.details.admission_date,
                    a.details.cid_primary,
                    a.month_reference
                );
            }
        }
        Commands::AddAction {
            attendance_id,
            professional_id,
            procedure_id,
            action_date,
            quantity,
            notes,
        } => {
            let action = services.attendances.add_action(
                *attendance_id,
                AttendanceActionDetails {
                    professional_id: *professional_id,
                    procedure_id: *procedure_id,
                    action_date: *action_date,
                    quantity: *quantity,
                    notes: notes.clone(),
                },
            )?;
            println!("Created action with ID: {}", action.id);
        }
        Commands::ListActions { attendance_id } => {
            for a in services.attendances.list_actions(*attendance_id)? {
                println!(
                    "ID: {}, Date: {}, Professional: {}, Procedure: {}, Quantity: {}",
                    a.id,
                    a.details.action_date,
                    a.details.professional_id,
                    a.details.procedure_id,
                    a.details.quantity
                );
            }
        }
        Commands::Stats => {
            let counts = services.dashboard.counts()?;
            println!("Patients: {}", counts.patients);
            println!("Professionals: {}", counts.professionals);
            println!("Procedures: {}", counts.procedures);
            println!("Attendances: {}", counts.attendances);
            println!("Actions: {}", counts.actions);
        }
        Commands::Export { out, date } => {
            let generated_on = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            match services.export.build(generated_on) {
                Ok(file) => {
                    let path = services.export.write_to_dir(&file, out)?;
                    println!(
                        "Wrote {} ({} attendance line(s))",
                        path.display(),
                        file.detail_count()
                    );
                }
                Err(CapsError::Raas(raas::RaasError::EmptyExport)) => {
                    println!("No attendances to export; no file written.");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}
