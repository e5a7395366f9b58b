//! Projection of hierarchical parameter names onto flat environment variables

use crate::domain::{Parameter, PATH_SEPARATOR};
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to do when two parameters map to the same variable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Later parameters replace earlier ones.
    #[default]
    Overwrite,
    /// Fail the run.
    Error,
}

/// Variable name to value, ordered by name.
pub type EnvVars = BTreeMap<String, String>;

/// `/prod/app/db_host` -> `DB_HOST`.
pub fn env_name(parameter_name: &str) -> String {
    let segment = parameter_name.rsplit(PATH_SEPARATOR).next().unwrap_or(parameter_name);
    segment.to_uppercase()
}

/// Map parameters to variables in iteration order, applying `policy` on collisions.
pub fn project<'a, I>(params: I, policy: CollisionPolicy) -> Result<EnvVars, Error>
where
    I: IntoIterator<Item = &'a Parameter>,
{
    let mut vars = EnvVars::new();
    let mut sources: BTreeMap<String, &str> = BTreeMap::new();

    for param in params {
        let name = env_name(&param.name);
        if name.is_empty() {
            tracing::warn!(parameter = %param.name, "Skipping parameter with empty final segment");
            continue;
        }

        if let Some(previous) = sources.insert(name.clone(), &param.name) {
            match policy {
                CollisionPolicy::Overwrite => tracing::warn!(
                    variable = %name,
                    previous,
                    replacement = %param.name,
                    "Variable name collision, keeping the later parameter"
                ),
                CollisionPolicy::Error => {
                    return Err(Error::NameCollision {
                        name,
                        first: previous.to_string(),
                        second: param.name.clone(),
                    })
                }
            }
        }
        vars.insert(name, param.value.clone());
    }

    Ok(vars)
}
