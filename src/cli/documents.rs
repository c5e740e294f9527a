//! Document command handlers

use crate::api::types::DeleteRequest;
use crate::cli::output::{format_delete, format_documents_table, format_ingest, format_json};
use crate::cli::{DeleteArgs, DocumentsArgs, IngestArgs};
use crate::client::RagClient;

/// Handle `ragchat documents`
pub async fn handle_documents(
    args: &DocumentsArgs,
    client: &RagClient,
) -> Result<String, Box<dyn std::error::Error>> {
    let listing = client.documents().await?;
    if args.json {
        Ok(format_json(&listing)?)
    } else {
        Ok(format_documents_table(&listing.items))
    }
}

/// Handle `ragchat ingest`
pub async fn handle_ingest(
    args: &IngestArgs,
    client: &RagClient,
) -> Result<String, Box<dyn std::error::Error>> {
    let response = client.ingest(&args.files).await?;
    if args.json {
        Ok(format_json(&response)?)
    } else {
        Ok(format_ingest(&response))
    }
}

/// Build the delete body from exactly one selector.
pub fn delete_request(args: &DeleteArgs) -> DeleteRequest {
    if args.all {
        DeleteRequest::all()
    } else if !args.key.is_empty() {
        DeleteRequest::keys(args.key.clone())
    } else {
        DeleteRequest::filenames(args.filename.clone())
    }
}

/// Handle `ragchat delete`
///
/// A response carrying an `error` field is reported as a failure.
pub async fn handle_delete(
    args: &DeleteArgs,
    client: &RagClient,
) -> Result<String, Box<dyn std::error::Error>> {
    let response = client.delete(&delete_request(args)).await?;
    if args.json {
        return Ok(format_json(&response)?);
    }
    match response.error {
        Some(ref error) => Err(format!("Delete failed: {}", error).into()),
        None => Ok(format_delete(&response)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ConnectionArgs;
    use std::path::PathBuf;

    fn delete_args(key: Vec<&str>, filename: Vec<&str>, all: bool) -> DeleteArgs {
        DeleteArgs {
            connection: ConnectionArgs {
                config: PathBuf::from("ragchat.toml"),
                url: None,
                log_level: None,
            },
            key: key.into_iter().map(String::from).collect(),
            filename: filename.into_iter().map(String::from).collect(),
            all,
            json: false,
        }
    }

    #[test]
    fn test_delete_request_selectors() {
        assert_eq!(
            delete_request(&delete_args(vec![], vec![], true)),
            DeleteRequest::all()
        );
        assert_eq!(
            delete_request(&delete_args(vec!["k1"], vec![], false)),
            DeleteRequest::keys(vec!["k1".to_string()])
        );
        assert_eq!(
            delete_request(&delete_args(vec![], vec!["a.pdf"], false)),
            DeleteRequest::filenames(vec!["a.pdf".to_string()])
        );
    }
}
