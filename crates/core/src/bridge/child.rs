//! Helper side of the bridge

use std::fs;
use std::path::Path;

use crate::backends::interactive::{PromptOutcome, Prompter, run_prompt_protocol};
use crate::error::Result;

use super::{BridgeRequest, BridgeResult};

/// Prompt for everything `request` asks and collect the answers.
pub fn serve(request: &BridgeRequest, prompter: &mut dyn Prompter) -> Result<BridgeResult> {
    let mut table = request.to_table();
    match run_prompt_protocol(prompter, &request.help_msg, &mut table)? {
        PromptOutcome::Aborted => Ok(BridgeResult::aborted()),
        PromptOutcome::Completed => Ok(BridgeResult::from_table(&table)),
    }
}

pub fn write_result(path: &Path, result: &BridgeResult) -> Result<()> {
    fs::write(path, serde_json::to_vec(result)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ConsolePrompter;
    use crate::marshal;
    use crate::types::{MethodSignature, TypeDescriptor, Value};
    use std::io::{self, Cursor};

    fn request(out_file: &Path) -> BridgeRequest {
        let sig = MethodSignature::new("Negotiate")
            .input("clientVersion", TypeDescriptor::String)
            .output("serverVersion", TypeDescriptor::I32)
            .returns(TypeDescriptor::I32);
        let table = marshal::build(&sig, &[Value::from("1.0")]).unwrap();
        BridgeRequest::from_table("Negotiate.", &table, out_file.to_path_buf())
    }

    #[test]
    fn test_serve_and_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        let request = request(&path);
        let mut prompter = ConsolePrompter::new(Cursor::new("Y\nx\n5\n"), io::sink());

        let result = serve(&request, &mut prompter).unwrap();
        write_result(&path, &result).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, r#"{"ReturnValue":"1","OutArgValues":{"serverVersion":"5"}}"#);
        assert!(result.validate(&request).is_ok());
    }

    #[test]
    fn test_serve_abort() {
        let request = request(Path::new("/unused"));
        let mut prompter = ConsolePrompter::new(Cursor::new("a\n"), io::sink());

        assert_eq!(serve(&request, &mut prompter).unwrap(), BridgeResult::aborted());
    }
}
