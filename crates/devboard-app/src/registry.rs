//! Client-side event delegation
//!
//! Rendered fragments are replaced wholesale on every render, so handlers are
//! never attached to individual elements. Instead [`REGISTRY_BOOTSTRAP`]
//! installs `window.devboardRegistry`, which binds one document-level
//! listener per `(event kind, tab id)` and hands matching events to the tab's
//! handler as `(action, element, event)`, where `action` is the nearest
//! `data-action` attribute inside the tab's `[data-tab-id]` subtree.
//!
//! Tabs describe their handlers with [`DelegatedHandlers`], which compiles an
//! action table into a registration script.

use serde::Serialize;

/// Installs `window.devboardRegistry`. Emitted once per document.
pub const REGISTRY_BOOTSTRAP: &str = r#"(function () {
  if (window.devboardRegistry) { return; }
  var api = window.devboardApi ||
    (typeof acquireVsCodeApi === 'function' ? acquireVsCodeApi() : null);
  window.devboardApi = api;
  var handlers = { click: {}, change: {}, keypress: {} };
  var bound = {};

  function post(message) {
    if (api) { api.postMessage(message); }
    else if (window.parent && window.parent !== window) { window.parent.postMessage(message, '*'); }
  }

  function findAction(target, root) {
    var el = target;
    while (el && el !== root.parentElement) {
      if (el.getAttribute && el.getAttribute('data-action')) { return el; }
      el = el.parentElement;
    }
    return null;
  }

  function bind(kind, tabId, handler) {
    var key = kind + ':' + tabId;
    if (bound[key]) { return false; }
    bound[key] = true;
    handlers[kind][tabId] = handler;
    document.addEventListener(kind, function (event) {
      var target = event.target;
      var root = target && target.closest ? target.closest('[data-tab-id]') : null;
      if (!root || root.getAttribute('data-tab-id') !== tabId) { return; }
      var el = findAction(target, root);
      if (!el) { return; }
      handlers[kind][tabId](el.getAttribute('data-action'), el, event);
    });
    return true;
  }

  window.devboardRegistry = {
    registerClickHandler: function (tabId, handler) { return bind('click', tabId, handler); },
    registerChangeHandler: function (tabId, handler) { return bind('change', tabId, handler); },
    registerKeypressHandler: function (tabId, handler) { return bind('keypress', tabId, handler); },
    post: post
  };
})();"#;

/// DOM event kinds the registry delegates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Click,
    Change,
    /// Keypress, filtered to Enter
    Enter,
}

impl EventKind {
    fn register_fn(&self) -> &'static str {
        match self {
            EventKind::Click => "registerClickHandler",
            EventKind::Change => "registerChangeHandler",
            EventKind::Enter => "registerKeypressHandler",
        }
    }
}

/// Outbound command posted when an action fires.
///
/// `attrs` are copied from the element's `data-*` attributes under the same
/// name; `value` and `checked` name the payload keys that receive the
/// element's `value` and `checked` properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostCommand {
    pub command: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<String>,
}

impl PostCommand {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            attrs: Vec::new(),
            value: None,
            checked: None,
        }
    }

    pub fn attr(mut self, name: &str) -> Self {
        self.attrs.push(name.to_string());
        self
    }

    pub fn value(mut self, key: &str) -> Self {
        self.value = Some(key.to_string());
        self
    }

    pub fn checked(mut self, key: &str) -> Self {
        self.checked = Some(key.to_string());
        self
    }
}

/// Builder for a tab's registration script.
#[derive(Debug, Clone)]
pub struct DelegatedHandlers {
    tab_id: String,
    bindings: Vec<(EventKind, String, PostCommand)>,
}

impl DelegatedHandlers {
    pub fn new(tab_id: &str) -> Self {
        Self {
            tab_id: tab_id.to_string(),
            bindings: Vec::new(),
        }
    }

    pub fn on(mut self, kind: EventKind, action: &str, command: PostCommand) -> Self {
        self.bindings.push((kind, action.to_string(), command));
        self
    }

    pub fn on_click(self, action: &str, command: PostCommand) -> Self {
        self.on(EventKind::Click, action, command)
    }

    pub fn on_change(self, action: &str, command: PostCommand) -> Self {
        self.on(EventKind::Change, action, command)
    }

    pub fn on_enter(self, action: &str, command: PostCommand) -> Self {
        self.on(EventKind::Enter, action, command)
    }

    fn table(&self, kind: EventKind) -> serde_json::Map<String, serde_json::Value> {
        self.bindings
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .map(|(_, action, command)| {
                (
                    action.clone(),
                    serde_json::to_value(command).unwrap_or_default(),
                )
            })
            .collect()
    }

    /// Compile the registration script.
    pub fn build(&self) -> String {
        let mut script = String::from("(function () {\n  var registry = window.devboardRegistry;\n  if (!registry) { return; }\n");
        script.push_str(&format!("  var tabId = {};\n", js_literal(&self.tab_id)));
        script.push_str(
            "  function run(table, action, el) {\n\
             \x20   var binding = table[action];\n\
             \x20   if (!binding) { return; }\n\
             \x20   var message = { command: binding.command, tabId: tabId };\n\
             \x20   (binding.attrs || []).forEach(function (name) { message[name] = el.getAttribute('data-' + name); });\n\
             \x20   if (binding.value) { message[binding.value] = el.value; }\n\
             \x20   if (binding.checked) { message[binding.checked] = el.checked; }\n\
             \x20   registry.post(message);\n\
             \x20 }\n",
        );

        for kind in [EventKind::Click, EventKind::Change, EventKind::Enter] {
            let table = self.table(kind);
            if table.is_empty() {
                continue;
            }
            let literal = js_literal(&serde_json::Value::Object(table));
            let guard = if kind == EventKind::Enter {
                "if (event.key !== 'Enter') { return; } "
            } else {
                ""
            };
            script.push_str(&format!(
                "  registry.{}(tabId, function (action, el, event) {{ {}run({}, action, el); }});\n",
                kind.register_fn(),
                guard,
                literal
            ));
        }

        script.push_str("})();");
        script
    }
}

/// JSON-encode a value for embedding inside a `<script>` element.
pub fn js_literal<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}
