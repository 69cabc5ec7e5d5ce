//! Collaborators that talk to a DSP server: ontologies, lists and the enabled licenses of a
//! project. The validation pipeline only sees the traits, `ApiConnection` implements all of
//! them over blocking HTTP.

use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error, info};
use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::errors::ApiResponseError;

pub trait OntologyClient {
    /// The `knora-api` ontology as Turtle.
    fn get_knora_api(&self) -> Result<String>;
    /// Every ontology of the project as one Turtle document each.
    fn get_ontologies(&self, shortcode: &str) -> Result<Vec<String>>;
}

pub trait ListClient {
    fn get_lists(&self, shortcode: &str) -> Result<Vec<OneList>>;
}

pub trait LegalInfoClient {
    /// IRIs of the licenses that are enabled for the project.
    fn get_licenses(&self, shortcode: &str) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneList {
    pub list_iri: String,
    pub list_name: String,
    pub nodes: Vec<OneNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneNode {
    pub name: String,
    pub iri: String,
}

impl OneList {
    /// The `salsah-gui:guiAttribute` with which a property points to this list.
    pub fn hlist(&self) -> String {
        format!("hlist=<{}>", self.list_iri)
    }

    /// Every node in the form `list / node`, the way list values are written into the data
    /// graph.
    pub fn user_facing_nodes(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|node| format!("{} / {}", self.list_name, node.name))
            .collect()
    }
}

/// Blocking HTTP access to the DSP API.
#[derive(Clone)]
pub struct ApiConnection {
    api_url: String,
    client: Client,
}

impl ApiConnection {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build the HTTP client")?;
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn get(&self, url: &str, accept: &str) -> Result<Response> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(ACCEPT, accept)
            .send()
            .with_context(|| format!("Request to {} failed", url))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let err = ApiResponseError {
                request: url.to_string(),
                status: status.as_u16(),
                body,
            };
            error!("{}", err);
            return Err(err.into());
        }
        Ok(response)
    }

    fn get_turtle(&self, url: &str) -> Result<String> {
        let response = self.get(url, "text/turtle")?;
        Ok(response.text()?)
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = self.get(url, "application/json")?;
        response
            .json::<T>()
            .with_context(|| format!("Unexpected response from {}", url))
    }

    fn get_one_list(&self, list_iri: &str) -> Result<OneList> {
        let encoded: String = url::form_urlencoded::byte_serialize(list_iri.as_bytes()).collect();
        let url = format!("{}/admin/lists/{}", self.api_url, encoded);
        let response: ListResponse = self.get_json(&url)?;
        let mut nodes = Vec::new();
        collect_nodes(&response.list.children, &mut nodes);
        Ok(OneList {
            list_iri: response.list.listinfo.id,
            list_name: response.list.listinfo.name,
            nodes,
        })
    }
}

#[derive(Deserialize)]
struct ProjectResponse {
    project: ProjectInfo,
}

#[derive(Deserialize)]
struct ProjectInfo {
    ontologies: Vec<String>,
}

#[derive(Deserialize)]
struct ListsResponse {
    lists: Vec<ListInfo>,
}

#[derive(Deserialize)]
struct ListInfo {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct ListResponse {
    list: ListWithChildren,
}

#[derive(Deserialize)]
struct ListWithChildren {
    listinfo: ListInfo,
    #[serde(default)]
    children: Vec<ListChild>,
}

#[derive(Deserialize)]
struct ListChild {
    id: String,
    name: String,
    #[serde(default)]
    children: Vec<ListChild>,
}

#[derive(Deserialize)]
struct LicensesResponse {
    data: Vec<LicenseInfo>,
}

#[derive(Deserialize)]
struct LicenseInfo {
    id: String,
}

fn collect_nodes(children: &[ListChild], nodes: &mut Vec<OneNode>) {
    for child in children {
        nodes.push(OneNode {
            name: child.name.clone(),
            iri: child.id.clone(),
        });
        collect_nodes(&child.children, nodes);
    }
}

impl OntologyClient for ApiConnection {
    fn get_knora_api(&self) -> Result<String> {
        info!("Fetching the knora-api ontology");
        self.get_turtle(&format!("{}/ontology/knora-api/v2#", self.api_url))
    }

    fn get_ontologies(&self, shortcode: &str) -> Result<Vec<String>> {
        let url = format!("{}/admin/projects/shortcode/{}", self.api_url, shortcode);
        let project: ProjectResponse = self.get_json(&url)?;
        info!(
            "Fetching {} ontologies of project {}",
            project.project.ontologies.len(),
            shortcode
        );
        project
            .project
            .ontologies
            .iter()
            .map(|iri| self.get_turtle(&format!("{}?allLanguages=true", iri)))
            .collect()
    }
}

impl ListClient for ApiConnection {
    fn get_lists(&self, shortcode: &str) -> Result<Vec<OneList>> {
        let url = format!("{}/admin/lists?projectShortcode={}", self.api_url, shortcode);
        let lists: ListsResponse = self.get_json(&url)?;
        debug!("Project {} has {} lists", shortcode, lists.lists.len());
        lists
            .lists
            .iter()
            .map(|list| self.get_one_list(&list.id))
            .collect()
    }
}

impl LegalInfoClient for ApiConnection {
    fn get_licenses(&self, shortcode: &str) -> Result<Vec<String>> {
        let url = format!(
            "{}/admin/projects/shortcode/{}/legal-info/licenses?page=1&page-size=100&order=Asc&showOnlyEnabled=true",
            self.api_url, shortcode
        );
        let licenses: LicensesResponse = self.get_json(&url)?;
        Ok(licenses.data.into_iter().map(|l| l.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_nodes_are_flattened_depth_first() {
        let json = r#"{
            "list": {
                "listinfo": {"id": "http://rdfh.ch/lists/0001/l1", "name": "colors"},
                "children": [
                    {"id": "http://rdfh.ch/lists/0001/n1", "name": "red", "children": [
                        {"id": "http://rdfh.ch/lists/0001/n11", "name": "dark-red"}
                    ]},
                    {"id": "http://rdfh.ch/lists/0001/n2", "name": "blue"}
                ]
            }
        }"#;
        let response: ListResponse = serde_json::from_str(json).unwrap();
        let mut nodes = Vec::new();
        collect_nodes(&response.list.children, &mut nodes);
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["red", "dark-red", "blue"]);
    }

    #[test]
    fn one_list_renders_user_facing_nodes() {
        let list = OneList {
            list_iri: "http://rdfh.ch/lists/0001/l1".to_string(),
            list_name: "colors".to_string(),
            nodes: vec![OneNode {
                name: "red".to_string(),
                iri: "http://rdfh.ch/lists/0001/n1".to_string(),
            }],
        };
        assert_eq!(list.user_facing_nodes(), vec!["colors / red"]);
        assert_eq!(list.hlist(), "hlist=<http://rdfh.ch/lists/0001/l1>");
    }
}
