//! Embedded CSS and JS for the rendered dashboard page.
//!
//! Compiled into the binary as string constants. The only external asset is
//! Chart.js, which draws the chart configurations built in Rust.

/// Chart.js bundle loaded by the page.
pub const CHART_JS_URL: &str = "https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js";

pub const STYLE: &str = r#"
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --purple: #bc8cff;
  --cyan: #39d2c0;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1200px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 24px; font-weight: 600; }
header h1 .logo { color: var(--accent); font-family: var(--mono); font-weight: 700; }
header .subtitle { color: var(--text-muted); font-size: 13px; }

.toolbar { display: flex; gap: 8px; align-items: center; }

button, .button {
  padding: 6px 14px;
  border: 1px solid var(--border);
  border-radius: 6px;
  background: var(--surface);
  color: var(--text);
  font-size: 13px;
  cursor: pointer;
  text-decoration: none;
}
button:hover, .button:hover { border-color: var(--accent); }
button.active { background: var(--accent); border-color: var(--accent); color: #fff; }
button.danger { border-color: var(--red); color: var(--red); }

.badge {
  display: inline-flex;
  align-items: center;
  padding: 2px 10px;
  border-radius: 12px;
  font-size: 12px;
  font-weight: 500;
  background: var(--surface);
  border: 1px solid var(--border);
}

.banner {
  display: flex;
  align-items: center;
  gap: 16px;
  padding: 14px 18px;
  margin-bottom: 16px;
  border-radius: var(--radius);
  border: 1px solid var(--border);
  border-left: 4px solid var(--accent);
  background: var(--surface);
}
.banner .body { flex: 1; }
.banner p { color: var(--text-muted); font-size: 13px; }
.banner.success { border-left-color: var(--green); }
.banner.info { border-left-color: var(--cyan); }
.banner.primary { border-left-color: var(--accent); }
.banner.warning { border-left-color: var(--yellow); }
.banner.danger { border-left-color: var(--red); }

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  margin-bottom: 16px;
}
.card h2 { font-size: 16px; font-weight: 600; margin-bottom: 16px; }

.stats-grid {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
  gap: 16px;
  margin-bottom: 24px;
}
.stat-card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  text-align: center;
}
.stat-card .value {
  font-size: 32px;
  font-weight: 700;
  font-family: var(--mono);
  color: var(--accent);
  line-height: 1.1;
}
.stat-card .label {
  font-size: 12px;
  color: var(--text-muted);
  margin-top: 6px;
  text-transform: uppercase;
  letter-spacing: 0.5px;
}

.grid-2 { display: grid; grid-template-columns: repeat(auto-fit, minmax(420px, 1fr)); gap: 16px; }

table { width: 100%; border-collapse: collapse; font-size: 13px; }
th, td { text-align: left; padding: 8px 12px; border-bottom: 1px solid var(--border); }
th {
  color: var(--text-muted);
  font-weight: 500;
  font-size: 12px;
  text-transform: uppercase;
  letter-spacing: 0.5px;
}
td.num, th.num { text-align: right; font-family: var(--mono); }
td.muted { color: var(--text-muted); text-align: center; }
tr:hover { background: rgba(255,255,255,0.02); }

.recommendation {
  padding: 14px 16px;
  margin-bottom: 12px;
  border: 1px solid var(--border);
  border-radius: var(--radius);
}
.recommendation h3 { display: inline; font-size: 14px; margin-right: 8px; }
.recommendation .severity { color: #fff; border: none; padding: 4px 12px; }
.recommendation .description { color: var(--text-muted); font-size: 13px; margin: 6px 0 10px; }
.recommendation dl { display: grid; grid-template-columns: repeat(3, 1fr); gap: 8px; font-size: 13px; }
.recommendation dt { font-weight: 600; }

.density-card {
  display: grid;
  grid-template-columns: 3fr 2fr 2fr 2fr 3fr;
  align-items: center;
  padding: 8px 12px;
  margin-bottom: 8px;
  border: 1px solid var(--border);
  border-radius: var(--radius);
}
.density-card small { color: var(--text-muted); }
.text-danger { color: var(--red); }
.text-warning { color: var(--yellow); }
.text-info { color: var(--cyan); }
.text-success { color: var(--green); }
.text-primary { color: var(--accent); }
.text-secondary { color: var(--text-muted); }

canvas { max-height: 340px; }

#actionMessage:empty { display: none; }
.upload-form { display: flex; flex-wrap: wrap; gap: 12px; align-items: end; }
.upload-form label { display: block; font-size: 12px; color: var(--text-muted); }
"#;

/// Page behaviour: charts, source switching, upload, delete, export.
///
/// Reads its data from the `plansight-data` JSON block written by the
/// renderer.
pub const SCRIPT: &str = r#"
(function () {
  const data = JSON.parse(document.getElementById('plansight-data').textContent);
  const charts = [];

  function showMessage(text, tone) {
    const box = document.getElementById('actionMessage');
    if (!box) return;
    box.className = 'banner ' + tone;
    box.textContent = text;
  }

  function reloadSoon() {
    setTimeout(function () { window.location.reload(); }, data.reloadDelayMs);
  }

  // Charts
  if (window.Chart) {
    data.charts.forEach(function (spec) {
      const canvas = document.getElementById(spec.mount);
      if (!canvas) return;
      const config = spec.config;
      const callbacks = {};
      if (spec.tooltips.titles) {
        callbacks.title = function (items) { return spec.tooltips.titles[items[0].dataIndex]; };
      }
      if (spec.tooltips.labels) {
        callbacks.label = function (item) { return spec.tooltips.labels[item.dataIndex]; };
      }
      config.options = config.options || {};
      config.options.plugins = config.options.plugins || {};
      config.options.plugins.tooltip = Object.assign({}, config.options.plugins.tooltip, { callbacks: callbacks });
      charts.push(new Chart(canvas, config));
    });
  }

  // Data source
  document.querySelectorAll('[data-source]').forEach(function (button) {
    button.addEventListener('click', function () {
      const source = button.getAttribute('data-source');
      const query = source === 'json' ? '?source=json' : '';
      window.location.href = '/analyze/' + encodeURIComponent(data.resourceType) + query;
    });
  });

  // Upload
  const form = document.getElementById('uploadForm');
  if (form) {
    form.addEventListener('submit', function (event) {
      event.preventDefault();
      const inputs = form.querySelectorAll('input[type=file]');
      const body = new FormData();
      let selected = 0;
      let missing = null;
      inputs.forEach(function (input) {
        const file = input.files[0];
        if (file) {
          body.append(input.name, file);
          selected += 1;
        } else if (input.dataset.required === 'true' && !missing) {
          missing = input.dataset.label;
        }
      });
      if (selected === 0) {
        showMessage(inputs.length > 1 ? 'Please select at least one file to upload' : 'Please select a file', 'danger');
        return;
      }
      if (missing) {
        showMessage('Please select a file for ' + missing, 'danger');
        return;
      }
      fetch('/upload/' + encodeURIComponent(data.resourceType), { method: 'POST', body: body })
        .then(function (r) { return r.json(); })
        .then(function (reply) {
          if (reply.success) {
            showMessage(reply.message + ' Reloading analysis...', 'success');
            reloadSoon();
          } else {
            showMessage(reply.error || 'Upload failed', 'danger');
          }
        })
        .catch(function (e) { showMessage('Error uploading file(s): ' + e, 'danger'); });
    });
  }

  // Delete
  document.querySelectorAll('[data-action=delete]').forEach(function (button) {
    button.addEventListener('click', function () {
      if (!window.confirm('Delete all uploaded files for this resource type?')) return;
      fetch('/delete-uploads/' + encodeURIComponent(data.resourceType), { method: 'POST' })
        .then(function (r) { return r.json(); })
        .then(function (reply) {
          if (reply.success) {
            showMessage(reply.message + ' Data cleared. Reloading...', 'success');
            reloadSoon();
          } else {
            showMessage('Error: ' + reply.error, 'danger');
          }
        })
        .catch(function () { showMessage('Failed to delete files. Please try again.', 'danger'); });
    });
  });

  // Export
  document.querySelectorAll('[data-action=export]').forEach(function (button) {
    button.addEventListener('click', function () {
      fetch('/api/export/recommendations')
        .then(function (r) { return r.json(); })
        .then(function (doc) {
          const blob = new Blob([JSON.stringify(doc, null, 2)], { type: 'application/json' });
          const url = URL.createObjectURL(blob);
          const a = document.createElement('a');
          a.href = url;
          a.download = 'cost-optimization-recommendations.json';
          document.body.appendChild(a);
          a.click();
          document.body.removeChild(a);
          URL.revokeObjectURL(url);
        });
    });
  });

  // Reload
  document.querySelectorAll('[data-action=reload]').forEach(function (button) {
    button.addEventListener('click', function () { window.location.reload(); });
  });
})();
"#;
