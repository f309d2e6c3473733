//! Built-in skill vocabulary, used when no `TAXONOMY_PATH` is configured.

use crate::matching::taxonomy::{Taxonomy, TaxonomyError};

/// (category, canonical names)
pub const BUILTIN_SKILLS: &[(&str, &[&str])] = &[
    (
        "languages",
        &[
            "python", "java", "javascript", "typescript", "c++", "c#", "php", "ruby", "go",
            "rust", "swift", "kotlin", "r", "scala", "perl", "bash", "powershell",
        ],
    ),
    (
        "web",
        &[
            "html", "css", "react", "angular", "vue", "node.js", "express", "django", "flask",
            "spring", "laravel", "jquery", "bootstrap", "sass", "less", "webpack", "babel",
        ],
    ),
    (
        "databases",
        &[
            "sql", "mysql", "postgresql", "mongodb", "redis", "elasticsearch", "oracle",
            "sqlite", "cassandra", "dynamodb", "neo4j", "firebase",
        ],
    ),
    (
        "cloud_devops",
        &[
            "aws", "azure", "gcp", "docker", "kubernetes", "jenkins", "git", "github", "gitlab",
            "ci/cd", "terraform", "ansible", "chef", "puppet", "vagrant",
        ],
    ),
    (
        "data_ml",
        &[
            "machine learning", "deep learning", "tensorflow", "pytorch", "scikit-learn",
            "pandas", "numpy", "matplotlib", "seaborn", "jupyter", "spark", "hadoop", "kafka",
        ],
    ),
    (
        "mobile",
        &["android", "ios", "react native", "flutter", "xamarin", "ionic"],
    ),
    (
        "testing",
        &[
            "unit testing", "integration testing", "selenium", "cypress", "jest", "pytest",
            "junit",
        ],
    ),
    (
        "other",
        &[
            "linux", "windows", "macos", "rest api", "graphql", "microservices", "agile",
            "scrum", "project management", "leadership", "communication", "problem solving",
        ],
    ),
];

/// (canonical name, aliases)
pub const BUILTIN_ALIASES: &[(&str, &[&str])] = &[
    ("javascript", &["js", "ecmascript"]),
    ("typescript", &["ts"]),
    ("go", &["golang"]),
    ("node.js", &["nodejs", "node js", "node"]),
    ("c++", &["cpp", "c plus plus"]),
    ("c#", &["csharp", "c sharp"]),
    ("postgresql", &["postgres"]),
    ("kubernetes", &["k8s"]),
    ("gcp", &["google cloud"]),
    ("vue", &["vue.js", "vuejs"]),
    ("react", &["react.js", "reactjs"]),
    ("machine learning", &["ml", "machinelearning"]),
    ("deep learning", &["dl", "deeplearning"]),
    ("scikit-learn", &["sklearn", "scikit learn"]),
    ("rest api", &["rest", "api", "apis", "rest apis", "restful"]),
    ("ci/cd", &["cicd", "continuous integration", "continuous deployment"]),
    ("unit testing", &["unit test", "unit tests"]),
    ("integration testing", &["integration test", "integration tests"]),
    ("project management", &["pm", "project manager"]),
];

/// Builds the built-in taxonomy. Fails only if the tables above conflict.
pub fn builtin_taxonomy() -> Result<Taxonomy, TaxonomyError> {
    let mut taxonomy = Taxonomy::new();
    for (category, names) in BUILTIN_SKILLS {
        for name in *names {
            taxonomy.register(name, Some(*category))?;
        }
    }
    for (name, aliases) in BUILTIN_ALIASES {
        let id = taxonomy.register(name, None)?;
        for alias in *aliases {
            taxonomy.add_alias(alias, id)?;
        }
    }
    Ok(taxonomy)
}
