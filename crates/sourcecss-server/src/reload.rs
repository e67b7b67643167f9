//! WebSocket reload notifications.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Messages sent to open pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// Connection established
    Connected,

    /// Stylesheets were regenerated
    Reload {
        /// Regenerated components
        components: Vec<String>,
    },

    /// Regeneration failed; pages keep the previous stylesheets
    Failed {
        /// Error description
        message: String,
    },
}

/// Hub broadcasting reload messages to every connected page.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to all connected pages.
    pub fn send(&self, msg: ReloadMessage) {
        // No receivers is fine
        let _ = self.sender.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    /// Number of connected pages.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Client script connecting a page to the reload socket at `path`.
pub fn reload_client_script(path: &str) -> String {
    format!(
        r#"
(function() {{
  'use strict';

  const scheme = location.protocol === 'https:' ? 'wss://' : 'ws://';
  const ws = new WebSocket(scheme + location.host + '{}');

  ws.onmessage = function(event) {{
    const msg = JSON.parse(event.data);

    switch (msg.type) {{
      case 'reload':
        console.log('[sourcecss] regenerated', msg.components.join(', '));
        location.reload();
        break;

      case 'failed':
        console.error('[sourcecss] generation failed:', msg.message);
        break;

      case 'connected':
        console.log('[sourcecss] connected');
        break;
    }}
  }};

  ws.onclose = function() {{
    console.log('[sourcecss] disconnected, retrying');
    setTimeout(function() {{ location.reload(); }}, 1000);
  }};
}})();
"#,
        path
    )
}
