//! Built-in plugins.
//!
//! | Key | Capabilities |
//! |-----|--------------|
//! | `go.kubeforge.io/v4` (bundle) | init, create api, create webhook, edit |
//! | `kustomize.common.kubeforge.io/v2` | init, create api, create webhook, edit |
//! | `base.go.kubeforge.io/v4` | init, create api, create webhook, edit |
//! | `network-policy.kubeforge.io/v1-alpha` | edit |

mod golang;
mod kustomize;
mod network_policy;
mod support;

use std::sync::Arc;

use kubeforge_core::{
    application::{Bundle, Plugin, TemplateRenderer},
    domain::{PluginKey, PluginVersion},
    error::ForgeResult,
};

pub use golang::GoPlugin;
pub use kustomize::KustomizePlugin;
pub use network_policy::NetworkPolicyPlugin;

pub const GO_BUNDLE: &str = "go.kubeforge.io";

/// The default layout: manifests first, then Go sources.
pub fn go_bundle(renderer: Arc<dyn TemplateRenderer>) -> ForgeResult<Bundle> {
    let kustomize: Arc<dyn Plugin> = Arc::new(KustomizePlugin::new(Arc::clone(&renderer))?);
    let golang: Arc<dyn Plugin> = Arc::new(GoPlugin::new(renderer)?);

    Ok(Bundle::builder(PluginKey::new(GO_BUNDLE, PluginVersion::stable(4))?)
        .description("Go operator project with kustomize manifests")
        .member(kustomize)
        .member(golang)
        .build()?)
}
