use async_trait::async_trait;

use crate::models::Module;
use crate::status::StatusHandle;

/// Known hosts whose modules are mirrored on GitHub, as `(from, to)` path
/// prefixes.
const REWRITES: &[(&str, &str)] = &[
    ("golang.org/x", "github.com/golang"),
    ("go.googlesource.com", "github.com/golang"),
    ("google.golang.org/grpc", "github.com/grpc/grpc-go"),
    ("google.golang.org/protobuf", "github.com/protocolbuffers/protobuf-go"),
    ("google.golang.org/genproto", "github.com/googleapis/go-genproto"),
    ("google.golang.org/api", "github.com/googleapis/google-api-go-client"),
    ("cloud.google.com/go", "github.com/googleapis/google-cloud-go"),
    ("go.uber.org", "github.com/uber-go"),
    ("k8s.io", "github.com/kubernetes"),
    ("sigs.k8s.io", "github.com/kubernetes-sigs"),
    ("go.etcd.io", "github.com/etcd-io"),
    ("go.opentelemetry.io/otel", "github.com/open-telemetry/opentelemetry-go"),
];

/// Fixed-pattern rewrites for well-known Go ecosystem hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct GolangTranslator;

fn rewrite(path: &str) -> Option<String> {
    REWRITES.iter().find_map(|(from, to)| {
        let rest = path.strip_prefix(from)?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(format!("{}{}", to, rest))
        } else {
            None
        }
    })
}

#[async_trait]
impl super::Translator for GolangTranslator {
    fn name(&self) -> &'static str {
        "golang"
    }

    async fn translate(&self, module: &Module, _status: &StatusHandle) -> Option<Module> {
        rewrite(&module.path).map(|path| module.with_path(path))
    }
}
