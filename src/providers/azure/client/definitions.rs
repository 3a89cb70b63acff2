use super::core::AzureDevOpsClient;
use crate::error::{PipeLensError, Result};
use crate::gateway::{Definition, DefinitionRef};
use crate::providers::azure::types::{BuildDefinition, DefinitionReference, ListResponse};

const PAGE_SIZE: usize = 200;

impl AzureDevOpsClient {
    /// Lists every build definition of the project, following continuation tokens.
    ///
    /// # Errors
    ///
    /// Returns [`PipeLensError::ProjectNotFound`] when the project does not exist,
    /// or any API/network error.
    pub async fn list_definitions(&self, project: &str) -> Result<Vec<DefinitionRef>> {
        let mut definitions = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut url = self.api_url(project, "build/definitions")?;
            url.query_pairs_mut()
                .append_pair("queryOrder", "definitionNameAscending")
                .append_pair("$top", &PAGE_SIZE.to_string());
            if let Some(token) = &continuation {
                url.query_pairs_mut().append_pair("continuationToken", token);
            }

            let (page, next): (ListResponse<DefinitionReference>, _) =
                self.get_json_page(url).await.map_err(|e| match e {
                    PipeLensError::ApiError {
                        status: 404,
                        message,
                    } => PipeLensError::ProjectNotFound {
                        project: project.to_string(),
                        message,
                    },
                    other => other,
                })?;

            definitions.extend(page.value.into_iter().map(DefinitionRef::from));

            match next {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        Ok(definitions)
    }

    /// # Errors
    ///
    /// Returns [`PipeLensError::DefinitionNotFound`] on 404, or any API/network error.
    pub async fn get_definition(&self, project: &str, id: u64) -> Result<Definition> {
        let url = self.api_url(project, &format!("build/definitions/{id}"))?;

        let definition: BuildDefinition = self.get_json(url).await.map_err(|e| match e {
            PipeLensError::ApiError { status: 404, .. } => PipeLensError::DefinitionNotFound(id),
            other => other,
        })?;

        Ok(definition.into())
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    fn client(server: &mockito::ServerGuard) -> AzureDevOpsClient {
        AzureDevOpsClient::new(&server.url(), "contoso", Some("pat".into()), None).unwrap()
    }

    #[tokio::test]
    async fn test_list_definitions_follows_continuation_token() {
        let mut server = mockito::Server::new_async().await;
        let page_one = server
            .mock("GET", "/contoso/Web/_apis/build/definitions")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("api-version".into(), "7.1".into()),
                Matcher::Regex("top=200$".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_header("x-ms-continuationtoken", "next-page")
            .with_body(r#"{"count":2,"value":[{"id":1,"name":"a","path":"\\"},{"id":2,"name":"b","path":"\\"}]}"#)
            .create_async()
            .await;
        let page_two = server
            .mock("GET", "/contoso/Web/_apis/build/definitions")
            .match_query(Matcher::UrlEncoded(
                "continuationToken".into(),
                "next-page".into(),
            ))
            .with_header("content-type", "application/json")
            .with_body(r#"{"count":1,"value":[{"id":3,"name":"c","path":"\\Ops"}]}"#)
            .create_async()
            .await;

        let definitions = client(&server).list_definitions("Web").await.unwrap();

        let ids: Vec<u64> = definitions.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(definitions[2].path, "\\Ops");
        page_one.assert_async().await;
        page_two.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_definitions_unknown_project() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/contoso/Nope/_apis/build/definitions")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message":"TF200016: The following project does not exist: Nope"}"#)
            .create_async()
            .await;

        let error = client(&server).list_definitions("Nope").await.unwrap_err();
        match error {
            PipeLensError::ProjectNotFound { project, message } => {
                assert_eq!(project, "Nope");
                assert_eq!(
                    message,
                    "TF200016: The following project does not exist: Nope"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_definition() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/contoso/Web/_apis/build/definitions/12")
            .match_query(Matcher::UrlEncoded("api-version".into(), "7.1".into()))
            .match_header("authorization", Matcher::Regex("^Basic ".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":12,"name":"web","path":"\\","repository":{"id":"r1","name":"web","defaultBranch":"refs/heads/main"},"process":{"type":2,"yamlFilename":"azure-pipelines.yml"}}"#)
            .create_async()
            .await;

        let definition = client(&server).get_definition("Web", 12).await.unwrap();

        assert_eq!(definition.name, "web");
        assert_eq!(definition.yaml_file_name.as_deref(), Some("azure-pipelines.yml"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_definition_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/contoso/Web/_apis/build/definitions/99")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let error = client(&server).get_definition("Web", 99).await.unwrap_err();
        assert!(matches!(error, PipeLensError::DefinitionNotFound(99)));
    }
}
