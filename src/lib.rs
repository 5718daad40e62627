pub mod config;
pub mod generator;
pub mod literal;
pub mod measure;
pub mod model;
pub mod naming;
pub mod snapshot;
pub mod store;
pub mod types;

use wasm_bindgen::prelude::*;

pub use generator::{GeneratorOptions, ScriptGenerator};
pub use model::Project;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Render the full DDL script for a project with default options.
pub fn generate(project: &Project) -> String {
    ScriptGenerator::default().generate(project)
}

/// Render a project snapshot (JSON) to a T-SQL script
#[wasm_bindgen(js_name = "generateScript")]
pub fn generate_script(snapshot_json: &str) -> Result<String, String> {
    let project = snapshot::from_json(snapshot_json).map_err(|e| e.to_string())?;
    Ok(generate(&project))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_script_from_json() {
        let json = r#"{
            "name": "Shop",
            "tables": [{
                "name": "Orders",
                "columns": [
                    { "name": "Id", "dataType": "int", "isPrimaryKey": true, "isIdentity": true },
                    { "name": "Status", "dataType": "nvarchar", "length": 20, "isUnique": true }
                ]
            }]
        }"#;
        let script = generate_script(json).unwrap();
        assert!(script.contains("-- SQL generated for project: Shop"));
        assert!(script.contains("[Id] int IDENTITY(1,1) NOT NULL"));
        assert!(script.contains("CONSTRAINT [UQ_Orders_Status] UNIQUE"));
        assert!(script.contains("CONSTRAINT [PK_Orders] PRIMARY KEY ([Id] ASC)"));
    }

    #[test]
    fn test_generate_script_reports_invalid_snapshot() {
        let err = generate_script(r#"{ "name": "" }"#).unwrap_err();
        assert_eq!(err, "name is required");
    }
}
