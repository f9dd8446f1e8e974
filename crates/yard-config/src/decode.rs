//! Decoding of KDL nodes into resources.
//!
//! Every top-level node is a resource block: the node name is the type tag,
//! the first argument is the resource name and attributes are child nodes.
//!
//! ```kdl
//! container "consul" {
//!     image "consul:${env(CONSUL_VERSION)}"
//!     network "network.onprem"
//!     port local=8500 host=18500
//!     volume source="./consul_config" destination="/config"
//!     depends_on "network.onprem"
//! }
//! ```

use kdl::{KdlDocument, KdlNode, KdlValue};
use std::path::Path;
use tracing::{debug, warn};
use yard_core::config::WAN_NETWORK;
use yard_core::resource::{
    Cluster, Container, Docs, EnvVar, ExecLocal, ExecRemote, Helm, Ingress, K8sConfig, Network,
    Port, Volume,
};
use yard_core::{Blueprint, Resource, ResourceType};

use crate::paths::ensure_absolute;
use crate::{ConfigError, ConfigResult, EvalContext};

type Decoder = fn(&Block<'_>) -> ConfigResult<Resource>;

/// Registration table mapping each type tag to its decoder.
const DECODERS: [(ResourceType, Decoder); 9] = [
    (ResourceType::Network, decode_network),
    (ResourceType::Cluster, decode_cluster),
    (ResourceType::Container, decode_container),
    (ResourceType::Helm, decode_helm),
    (ResourceType::K8sConfig, decode_k8s_config),
    (ResourceType::Ingress, decode_ingress),
    (ResourceType::Docs, decode_docs),
    (ResourceType::ExecLocal, decode_exec_local),
    (ResourceType::ExecRemote, decode_exec_remote),
];

fn decoder_for(tag: &str) -> Option<(ResourceType, Decoder)> {
    DECODERS
        .iter()
        .copied()
        .find(|(kind, _)| kind.as_str() == tag)
}

/// Decode every resource block of a document.
pub(crate) fn decode_document(
    doc: &KdlDocument,
    file: &Path,
    ctx: &EvalContext,
) -> ConfigResult<Vec<Resource>> {
    let mut resources = Vec::new();
    for node in doc.nodes() {
        if let Some(resource) = decode_node(node, file, ctx)? {
            resources.push(resource);
        }
    }
    Ok(resources)
}

/// Decode one block. Unknown block types yield `None`.
pub(crate) fn decode_node(
    node: &KdlNode,
    file: &Path,
    ctx: &EvalContext,
) -> ConfigResult<Option<Resource>> {
    let tag = node.name().value();
    let Some((kind, decoder)) = decoder_for(tag) else {
        warn!(block = %tag, file = %file.display(), "skipping unknown block");
        return Ok(None);
    };

    let name = first_string_arg(node)
        .ok_or_else(|| ConfigError::MissingField(format!("{tag} name")))?;
    if name.is_empty() || name.contains('.') {
        return Err(ConfigError::InvalidValue {
            field: format!("{tag} name"),
            message: format!("'{name}' must be non-empty and must not contain '.'"),
        });
    }
    if kind == ResourceType::Network && name == WAN_NETWORK {
        return Err(ConfigError::WanExists);
    }

    let block = Block {
        node,
        file,
        ctx,
        kind,
        name: name.to_string(),
    };
    let resource = decoder(&block)?.depends_on(block.strings("depends_on")?);
    debug!(address = %resource.address(), file = %file.display(), "decoded block");

    Ok(Some(resource))
}

/// Decode the metadata nodes of a `*.yard` file.
pub(crate) fn decode_blueprint(doc: &KdlDocument, ctx: &EvalContext) -> ConfigResult<Blueprint> {
    let mut blueprint = Blueprint::default();

    for node in doc.nodes() {
        let key = node.name().value();
        let value = || -> ConfigResult<String> {
            let raw = first_string_arg(node).ok_or_else(|| ConfigError::InvalidValue {
                field: key.to_string(),
                message: "expected a string".to_string(),
            })?;
            ctx.interpolate(raw)
        };

        match key {
            "title" => blueprint.title = value()?,
            "author" => blueprint.author = value()?,
            "slug" => blueprint.slug = value()?,
            "intro" => blueprint.intro = Some(value()?),
            "browser_window" | "browser_windows" => {
                for url in string_args(node, key)? {
                    blueprint.browser_windows.push(ctx.interpolate(url)?);
                }
            }
            other => warn!(node = %other, "ignoring unknown blueprint node"),
        }
    }

    Ok(blueprint)
}

/// A resource block being decoded, with the context needed to evaluate it.
pub(crate) struct Block<'a> {
    node: &'a KdlNode,
    file: &'a Path,
    ctx: &'a EvalContext,
    kind: ResourceType,
    name: String,
}

impl<'a> Block<'a> {
    fn field(&self, field: &str) -> String {
        format!("{}.{} {}", self.kind, self.name, field)
    }

    fn invalid(&self, field: &str, message: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            field: self.field(field),
            message: message.into(),
        }
    }

    fn children<'s>(&'s self, field: &'s str) -> impl Iterator<Item = &'a KdlNode> + 's {
        self.node
            .children()
            .into_iter()
            .flat_map(|doc| doc.nodes())
            .filter(move |child| child.name().value() == field)
    }

    fn eval(&self, value: &str) -> ConfigResult<String> {
        self.ctx.interpolate(value)
    }

    fn string(&self, field: &str) -> ConfigResult<Option<String>> {
        let Some(child) = self.children(field).next() else {
            return Ok(None);
        };
        match positional(child).next() {
            Some(value) => match value.as_string() {
                Some(s) => Ok(Some(self.eval(s)?)),
                None => Err(self.invalid(field, format!("expected a string, found {value}"))),
            },
            None => Err(self.invalid(field, "expected a value")),
        }
    }

    fn required_string(&self, field: &str) -> ConfigResult<String> {
        self.string(field)?
            .ok_or_else(|| ConfigError::MissingField(self.field(field)))
    }

    /// All string arguments of every child named `field`, in order.
    fn strings(&self, field: &str) -> ConfigResult<Vec<String>> {
        let mut values = Vec::new();
        for child in self.children(field) {
            for raw in string_args(child, &self.field(field))? {
                values.push(self.eval(raw)?);
            }
        }
        Ok(values)
    }

    fn path(&self, field: &str) -> ConfigResult<Option<String>> {
        Ok(self
            .string(field)?
            .filter(|p| !p.is_empty())
            .map(|p| ensure_absolute(&p, self.file)))
    }

    fn required_path(&self, field: &str) -> ConfigResult<String> {
        self.path(field)?
            .ok_or_else(|| ConfigError::MissingField(self.field(field)))
    }

    fn paths(&self, field: &str) -> ConfigResult<Vec<String>> {
        Ok(self
            .strings(field)?
            .iter()
            .map(|p| ensure_absolute(p, self.file))
            .collect())
    }

    fn bool(&self, field: &str) -> ConfigResult<Option<bool>> {
        let Some(child) = self.children(field).next() else {
            return Ok(None);
        };
        match positional(child).next() {
            // A bare flag node means true.
            None => Ok(Some(true)),
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| self.invalid(field, format!("expected a bool, found {value}"))),
        }
    }

    fn integer<T: TryFrom<i128>>(&self, field: &str) -> ConfigResult<Option<T>> {
        let Some(child) = self.children(field).next() else {
            return Ok(None);
        };
        let value = positional(child)
            .next()
            .ok_or_else(|| self.invalid(field, "expected a value"))?;
        self.integer_value(field, value).map(Some)
    }

    fn integer_value<T: TryFrom<i128>>(&self, field: &str, value: &KdlValue) -> ConfigResult<T> {
        let n = value
            .as_integer()
            .ok_or_else(|| self.invalid(field, format!("expected an integer, found {value}")))?;
        T::try_from(n).map_err(|_| self.invalid(field, format!("{n} is out of range")))
    }

    fn prop_integer<T: TryFrom<i128>>(&self, node: &KdlNode, key: &str) -> ConfigResult<Option<T>> {
        let field = format!("{} {}", node.name().value(), key);
        node.get(key)
            .map(|value| self.integer_value(&field, value))
            .transpose()
    }

    fn prop_string(&self, node: &KdlNode, key: &str) -> ConfigResult<Option<String>> {
        let field = format!("{} {}", node.name().value(), key);
        match node.get(key) {
            None => Ok(None),
            Some(value) => match value.as_string() {
                Some(s) => Ok(Some(self.eval(s)?)),
                None => Err(self.invalid(&field, format!("expected a string, found {value}"))),
            },
        }
    }

    /// `env "KEY" "value"` children.
    fn env(&self) -> ConfigResult<Vec<EnvVar>> {
        let mut vars = Vec::new();
        for child in self.children("env") {
            match string_args(child, &self.field("env"))?.as_slice() {
                [key, value] => vars.push(EnvVar {
                    key: (*key).to_string(),
                    value: self.eval(value)?,
                }),
                _ => return Err(self.invalid("env", "expected a key and a value")),
            }
        }
        Ok(vars)
    }

    /// `volume source="..." destination="..."` children.
    fn volumes(&self) -> ConfigResult<Vec<Volume>> {
        let mut volumes = Vec::new();
        for child in self.children("volume") {
            let source = self
                .prop_string(child, "source")?
                .ok_or_else(|| ConfigError::MissingField(self.field("volume source")))?;
            let destination = self
                .prop_string(child, "destination")?
                .ok_or_else(|| ConfigError::MissingField(self.field("volume destination")))?;
            volumes.push(Volume {
                source: ensure_absolute(&source, self.file),
                destination,
            });
        }
        Ok(volumes)
    }

    /// `port local=8500 host=18500 remote=8500 protocol="udp"` children.
    fn ports(&self) -> ConfigResult<Vec<Port>> {
        let mut ports = Vec::new();
        for child in self.children("port") {
            let local = self
                .prop_integer::<u16>(child, "local")?
                .ok_or_else(|| ConfigError::MissingField(self.field("port local")))?;
            let mut port = Port::new(local);
            port.host = self.prop_integer(child, "host")?;
            port.remote = self.prop_integer(child, "remote")?;
            if let Some(protocol) = self.prop_string(child, "protocol")? {
                port.protocol = protocol;
            }
            ports.push(port);
        }
        Ok(ports)
    }
}

fn positional(node: &KdlNode) -> impl Iterator<Item = &KdlValue> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .map(|e| e.value())
}

fn first_string_arg(node: &KdlNode) -> Option<&str> {
    positional(node).next().and_then(|v| v.as_string())
}

fn string_args<'n>(node: &'n KdlNode, field: &str) -> ConfigResult<Vec<&'n str>> {
    positional(node)
        .map(|value| {
            value.as_string().ok_or_else(|| ConfigError::InvalidValue {
                field: field.to_string(),
                message: format!("expected a string, found {value}"),
            })
        })
        .collect()
}

fn decode_network(block: &Block<'_>) -> ConfigResult<Resource> {
    Ok(Network::new(&block.name)
        .with_subnet(block.required_string("subnet")?)
        .into())
}

fn decode_cluster(block: &Block<'_>) -> ConfigResult<Resource> {
    let mut cluster = Cluster::new(&block.name).with_network(block.required_string("network")?);
    if let Some(driver) = block.string("driver")? {
        cluster.driver = driver;
    }
    cluster.version = block.string("version")?;
    if let Some(nodes) = block.integer("nodes")? {
        cluster.nodes = nodes;
    }
    cluster.images = block.strings("images")?;
    cluster.env = block.env()?;
    Ok(cluster.into())
}

fn decode_container(block: &Block<'_>) -> ConfigResult<Resource> {
    let mut container = Container::new(&block.name).with_image(block.required_string("image")?);
    if let Some(network) = block.string("network")? {
        container.network = network;
    }
    container.command = block.strings("command")?;
    container.env = block.env()?;
    container.volumes = block.volumes()?;
    container.ip_address = block.string("ip_address")?;
    container.ports = block.ports()?;
    Ok(container.into())
}

fn decode_helm(block: &Block<'_>) -> ConfigResult<Resource> {
    let mut helm = Helm::new(&block.name).with_cluster(block.required_string("cluster")?);
    helm.chart = block.required_path("chart")?;
    helm.values = block.path("values")?;
    Ok(helm.into())
}

fn decode_k8s_config(block: &Block<'_>) -> ConfigResult<Resource> {
    let mut k8s = K8sConfig::new(&block.name);
    k8s.cluster = block.required_string("cluster")?;
    k8s.paths = block.paths("paths")?;
    k8s.wait_until_ready = block.bool("wait_until_ready")?.unwrap_or(false);
    Ok(k8s.into())
}

fn decode_ingress(block: &Block<'_>) -> ConfigResult<Resource> {
    let mut ingress = Ingress::new(&block.name).with_target(block.required_string("target")?);
    ingress.service = block.string("service")?;
    ingress.ports = block.ports()?;
    ingress.ip_address = block.string("ip_address")?;
    Ok(ingress.into())
}

fn decode_docs(block: &Block<'_>) -> ConfigResult<Resource> {
    let mut docs = Docs::new(&block.name);
    docs.path = block.required_path("path")?;
    if let Some(port) = block.integer("port")? {
        docs.port = port;
    }
    docs.open_in_browser = block.bool("open_in_browser")?.unwrap_or(false);
    Ok(docs.into())
}

fn decode_exec_local(block: &Block<'_>) -> ConfigResult<Resource> {
    let mut exec = ExecLocal::new(&block.name);
    exec.script = block.required_path("script")?;
    exec.arguments = block.strings("arguments")?;
    exec.env = block.env()?;
    Ok(exec.into())
}

fn decode_exec_remote(block: &Block<'_>) -> ConfigResult<Resource> {
    let mut exec = ExecRemote::new(&block.name);
    exec.target = block.string("target")?;
    exec.network = block.string("network")?;
    if exec.target.is_none() && exec.network.is_none() {
        return Err(ConfigError::MissingField(block.field("target or network")));
    }
    exec.image = block.string("image")?;
    exec.script = block.path("script")?;
    exec.arguments = block.strings("arguments")?;
    exec.volumes = block.volumes()?;
    exec.env = block.env()?;
    Ok(exec.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EvalContextBuilder;

    fn decode(kdl: &str) -> ConfigResult<Vec<Resource>> {
        let doc: KdlDocument = kdl.parse().unwrap();
        let ctx = EvalContextBuilder::new()
            .with_env("CONSUL_VERSION", "1.8.0")
            .with_state_dir("/state")
            .build();
        decode_document(&doc, Path::new("/blueprints/consul/main.kdl"), &ctx)
    }

    #[test]
    fn test_decode_container() {
        let kdl = r#"
            container "consul" {
                image "consul:${env(CONSUL_VERSION)}"
                command "consul" "agent" "-dev"
                network "network.onprem"
                ip_address "10.6.0.200"
                env "CONSUL_HTTP_ADDR" "http://localhost:8500"
                volume source="./config" destination="/config"
                port local=8500 host=18500
                port local=8600 protocol="udp"
                depends_on "network.onprem"
            }
        "#;

        let resources = decode(kdl).unwrap();
        let Resource::Container(c) = &resources[0] else {
            panic!("expected a container");
        };

        assert_eq!(c.image, "consul:1.8.0");
        assert_eq!(c.command, vec!["consul", "agent", "-dev"]);
        assert_eq!(c.network, "network.onprem");
        assert_eq!(c.ip_address.as_deref(), Some("10.6.0.200"));
        assert_eq!(c.env[0].key, "CONSUL_HTTP_ADDR");
        assert_eq!(c.volumes[0].source, "/blueprints/consul/config");
        assert_eq!(c.volumes[0].destination, "/config");
        assert_eq!(c.ports.len(), 2);
        assert_eq!(c.ports[0].host, Some(18500));
        assert_eq!(c.ports[0].protocol, "tcp");
        assert_eq!(c.ports[1].protocol, "udp");
        assert_eq!(c.info.depends_on, vec!["network.onprem"]);
    }

    #[test]
    fn test_decode_helm_paths_and_k8s_config() {
        let kdl = r#"
            helm "consul" {
                cluster "cluster.k3s"
                chart "./helm/consul"
                values "/abs/values.yaml"
            }
            k8s_config "dashboard" {
                cluster "cluster.k3s"
                paths "./k8s/dashboard.yaml" "./k8s/rbac.yaml"
                wait_until_ready #true
            }
        "#;

        let resources = decode(kdl).unwrap();
        let Resource::Helm(h) = &resources[0] else {
            panic!("expected helm");
        };
        assert_eq!(h.chart, "/blueprints/consul/helm/consul");
        assert_eq!(h.values.as_deref(), Some("/abs/values.yaml"));

        let Resource::K8sConfig(k) = &resources[1] else {
            panic!("expected k8s_config");
        };
        assert_eq!(
            k.paths,
            vec![
                "/blueprints/consul/k8s/dashboard.yaml",
                "/blueprints/consul/k8s/rbac.yaml"
            ]
        );
        assert!(k.wait_until_ready);
    }

    #[test]
    fn test_depends_on_accumulates() {
        let kdl = r#"
            helm "consul" {
                cluster "cluster.k3s"
                chart "./chart"
                depends_on "cluster.k3s"
                depends_on "k8s_config.dashboard" "exec_local.setup"
            }
        "#;

        let resources = decode(kdl).unwrap();
        assert_eq!(
            resources[0].info().depends_on,
            vec!["cluster.k3s", "k8s_config.dashboard", "exec_local.setup"]
        );
    }

    #[test]
    fn test_defaults() {
        let kdl = r#"
            cluster "k3s" { network "network.wan"; }
            docs "docs" { path "./docs"; }
        "#;

        let resources = decode(kdl).unwrap();
        let Resource::Cluster(c) = &resources[0] else {
            panic!("expected a cluster");
        };
        assert_eq!(c.driver, "k3s");
        assert_eq!(c.nodes, 1);

        let Resource::Docs(d) = &resources[1] else {
            panic!("expected docs");
        };
        assert_eq!(d.port, 80);
        assert!(!d.open_in_browser);
    }

    #[test]
    fn test_wan_is_reserved() {
        let result = decode(r#"network "wan" { subnet "10.0.0.0/16"; }"#);
        assert!(matches!(result, Err(ConfigError::WanExists)));
    }

    #[test]
    fn test_missing_required_field() {
        let result = decode(r#"container "consul" { network "network.wan"; }"#);
        assert!(matches!(
            result,
            Err(ConfigError::MissingField(ref f)) if f == "container.consul image"
        ));
    }

    #[test]
    fn test_invalid_values() {
        let result = decode(r#"docs "docs" { path "./docs"; port "eighty"; }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = decode(r#"container "web" { image "nginx"; port local=70000; }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = decode(r#"network "on.prem" { subnet "10.6.0.0/16"; }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_exec_remote_needs_target_or_network() {
        let result = decode(r#"exec_remote "setup" { image "alpine"; }"#);
        assert!(matches!(result, Err(ConfigError::MissingField(_))));

        let resources = decode(
            r#"exec_remote "setup" {
                network "network.wan"
                image "alpine"
                script "./setup.sh"
            }"#,
        )
        .unwrap();
        let Resource::ExecRemote(e) = &resources[0] else {
            panic!("expected exec_remote");
        };
        assert_eq!(e.script.as_deref(), Some("/blueprints/consul/setup.sh"));
        assert!(e.target.is_none());
    }

    #[test]
    fn test_unknown_block_is_skipped() {
        let resources = decode(
            r#"
            variable "version" { default "1.0"; }
            network "onprem" { subnet "10.6.0.0/16"; }
            "#,
        )
        .unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].address().to_string(), "network.onprem");
    }

    #[test]
    fn test_decode_blueprint() {
        let doc: KdlDocument = r#"
            title "Consul on K3s"
            author "Dev Team"
            slug "consul_k3s"
            browser_windows "http://localhost:8500" "http://localhost:18080"
            intro "Run ${env(GREETING)}"
        "#
        .parse()
        .unwrap();
        let ctx = EvalContextBuilder::new().with_env("GREETING", "hello").build();

        let blueprint = decode_blueprint(&doc, &ctx).unwrap();
        assert_eq!(blueprint.title, "Consul on K3s");
        assert_eq!(blueprint.slug, "consul_k3s");
        assert_eq!(blueprint.browser_windows.len(), 2);
        assert_eq!(blueprint.intro.as_deref(), Some("Run hello"));
    }
}
