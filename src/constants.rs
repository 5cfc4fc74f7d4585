/// Baseline values for the tuning knobs in `PipelineConfig`.
/// Every list here is only a default: a config file replaces it wholesale.

pub const DEFAULT_COHORT_CUTOFF_YEAR: i32 = 2010;
pub const DEFAULT_REFERENCE_YEAR: i32 = 2020;
pub const DEFAULT_RANGE_SENTINEL: &str = "n.a.";
pub const DEFAULT_SLOT_CAPACITY: usize = 5;
pub const DEFAULT_SCRAPE_BATCH_SIZE: usize = 80;
pub const DEFAULT_HEALTH_INDUSTRY_TAG: &str = "health";

// Company table columns
pub const COL_ID: &str = "id";
pub const COL_NAME: &str = "name";
pub const COL_LAUNCH_YEAR: &str = "launch_year";
pub const COL_EMPLOYEES_RANGE: &str = "employees";
pub const COL_EMPLOYEES_LATEST: &str = "employees_latest";
pub const COL_GROWTH_STAGE: &str = "growth_stage";
pub const COL_TOTAL_FUNDING: &str = "total_funding_source";
pub const COL_PATENTS: &str = "nb_patents";
pub const COL_INDUSTRIES: &str = "industries";
pub const COL_INVESTORS: &str = "investors";
pub const COL_LINKEDIN_URL: &str = "linkedin_url";

/// Columns the company table must carry before any resolver runs.
pub const COMPANY_REQUIRED_COLUMNS: &[&str] = &[
    COL_ID,
    COL_LAUNCH_YEAR,
    COL_EMPLOYEES_RANGE,
    COL_EMPLOYEES_LATEST,
    COL_GROWTH_STAGE,
    COL_TOTAL_FUNDING,
    COL_INDUSTRIES,
    COL_INVESTORS,
    COL_LINKEDIN_URL,
];

// Personnel table columns
pub const COL_PERSON_NAME: &str = "name";
pub const COL_PERSON_TITLE: &str = "title";
pub const COL_PROFILE_URL: &str = "profile_url";
pub const COL_COMPANY_URL: &str = "company_url";

pub const PERSONNEL_REQUIRED_COLUMNS: &[&str] =
    &[COL_PERSON_NAME, COL_PERSON_TITLE, COL_COMPANY_URL];

// Profile fragment table columns
pub const COL_PROFILE_ID: &str = "profile_id";
pub const COL_CATEGORY: &str = "category";

pub const FRAGMENT_REQUIRED_COLUMNS: &[&str] = &[COL_PROFILE_ID, COL_CATEGORY];

pub const TECHNICAL_INCLUDE: &[&str] = &[
    "engineer",
    "scientist",
    "researcher",
    "r&d",
    "phd",
    "technician",
    "technical",
    "manufacturing",
    "process",
    "ingénieur",
    "scientifique",
    "chercheur",
    "recherche et développement",
    "doctorant",
    "cto ",
    "cso ",
    "technicien",
    "technique",
];

pub const TECHNICAL_EXCLUDE: &[&str] = &[
    "developer",
    "web",
    "stack",
    "développeur",
    "software",
    "consultant",
];

pub const DEGREE_MARKERS: &[&str] = &["phd", "ph.d", "doctorant"];

/// Capitalised entries are whole-word acronyms.
pub const FOUNDER_INCLUDE: &[&str] = &[
    "CEO",
    "CTO",
    "CSO",
    "founder",
    "fondateur",
    "fondatrice",
    "chief executive officer",
    "chief technology officer",
    "chief scientific officer",
    "chief medical officer",
];

pub const FOUNDER_EXCLUDE: &[&str] = &["assistant", "right hand", "bras droit"];

pub const INSTITUTE_ACRONYMS: &[&str] = &[
    "CNRS", "INSERM", "CEA", "INRIA", "INRAE", "INRA", "IRD", "CNES", "ONERA", "IFREMER", "BRGM",
    "ANSES", "CIRAD", "IRSN", "EMBL", "CERN", "ESA", "MIT", "EPFL", "ETH",
];

pub const INSTITUTE_PHRASES: &[&str] = &[
    "institut pasteur",
    "institut curie",
    "institut de recherche",
    "research institute",
    "laboratoire",
    "laboratory",
    "max planck",
    "fraunhofer",
    "centre national de la recherche scientifique",
    "commissariat à l'énergie atomique",
];

pub const POSTDOC_MARKERS: &[&str] = &["postdoc", "post-doc", "postdoctoral", "post-doctoral"];

pub const DEGREE_SLOT_MARKERS: &[&str] = &[
    "phd",
    "ph.d",
    "doctorat",
    "doctorate",
    "doctor of philosophy",
    "docteur",
];

pub const TITLE_DEGREE_MARKERS: &[&str] = &["phd", "ph.d", "doctorant"];

pub const PUBLICATION_TYPES: &[&str] = &["Patents", "Publications"];

pub const FUND_INVESTOR_TYPES: &[&str] = &["fund", "investor"];

pub fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
