use crate::preferences::ChartType;
use crate::risk::RiskCategory;

/// Renders the dashboard page. `session_id` must be header-safe; callers
/// pass a freshly minted UUID.
pub fn render_index(chart_type: ChartType, session_id: &str) -> String {
    let chart = match chart_type {
        ChartType::Bar => "bar",
        ChartType::Line => "line",
    };
    INDEX_HTML
        .replace("{{CHART_TYPE}}", chart)
        .replace("{{SESSION_ID}}", session_id)
        .replace("{{RISK_COLORS}}", &risk_colors())
        .replace("{{RISK_LABELS}}", &risk_labels())
}

fn risk_colors() -> String {
    let entries: Vec<String> = RiskCategory::ALL
        .iter()
        .map(|risk| format!("'{}': '{}'", risk.as_str(), risk.color()))
        .collect();
    format!("{{ {} }}", entries.join(", "))
}

fn risk_labels() -> String {
    let entries: Vec<String> = RiskCategory::ALL
        .iter()
        .map(|risk| format!("'{}': '{}'", risk.backend_label(), risk.as_str()))
        .collect();
    format!("{{ {} }}", entries.join(", "))
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Churn Dashboard</title>
  <style>
    :root {
      --ink: #53565a;
      --accent: #ed174d;
      --accent-2: #a50034;
      --card: #ffffff;
      --line: rgba(83, 86, 90, 0.14);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: #f6f6f7;
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 28px 18px 48px;
    }

    .app {
      width: min(1100px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    header {
      display: flex;
      justify-content: space-between;
      align-items: center;
      gap: 12px;
      flex-wrap: wrap;
    }

    h1 {
      margin: 0;
      font-size: clamp(1.6rem, 3vw, 2.2rem);
    }

    .card {
      background: var(--card);
      border-radius: 16px;
      border: 1px solid var(--line);
      padding: 20px;
    }

    .stats {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
      gap: 16px;
    }

    .stat .label {
      display: block;
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.06em;
    }

    .stat .value {
      font-size: 1.8rem;
      font-weight: 600;
    }

    .trend-up {
      color: var(--accent);
    }

    .trend-down {
      color: #2d7a4b;
    }

    .filters {
      display: flex;
      gap: 10px;
      flex-wrap: wrap;
      margin-bottom: 12px;
    }

    input, select, button {
      font: inherit;
      padding: 8px 12px;
      border-radius: 10px;
      border: 1px solid var(--line);
    }

    button {
      cursor: pointer;
      background: var(--accent);
      color: white;
      border: none;
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th, td {
      text-align: left;
      padding: 8px;
      border-bottom: 1px solid var(--line);
      font-size: 0.92rem;
    }

    tbody tr {
      cursor: pointer;
    }

    .badge {
      color: white;
      border-radius: 999px;
      padding: 2px 10px;
      font-size: 0.8rem;
    }

    #sentinel {
      height: 1px;
    }

    #detail[hidden] {
      display: none;
    }

    .status {
      min-height: 1.2em;
      font-size: 0.95rem;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }
  </style>
</head>
<body>
  <main class="app" data-chart-type="{{CHART_TYPE}}" data-session="{{SESSION_ID}}">
    <header>
      <h1>Customer Churn Dashboard</h1>
      <div>
        <select id="month"></select>
        <select id="chart-type">
          <option value="bar">Bar charts</option>
          <option value="line">Line charts</option>
        </select>
      </div>
    </header>

    <section class="stats">
      <div class="card stat"><span class="label">Total customers</span><span id="total" class="value">-</span><div id="total-trend"></div></div>
      <div class="card stat"><span class="label">Churned customers</span><span id="churn" class="value">-</span><div id="churn-rate"></div><div id="churn-trend"></div></div>
      <div class="card stat"><span class="label">New customers</span><span id="new" class="value">-</span><div id="new-rate"></div><div id="new-trend"></div></div>
    </section>

    <section class="card">
      <h2>Churn reasons</h2>
      <ul id="churn-reasons"></ul>
    </section>

    <section class="card">
      <h2>High-risk customers</h2>
      <table>
        <thead>
          <tr><th>Customer</th><th>Last access</th><th>Support calls</th><th>Churn risk</th><th>Months remaining</th></tr>
        </thead>
        <tbody id="high-risk"></tbody>
      </table>
    </section>

    <section class="card">
      <h2>Risk distribution</h2>
      <ul id="risk-distribution"></ul>
      <ul id="risk-factors"></ul>
    </section>

    <section class="card">
      <h2>Customers</h2>
      <form id="filters" class="filters">
        <input id="search" type="text" placeholder="Search by customer hash" />
        <select id="risk">
          <option value="">All risk levels</option>
          <option value="very-risk">Very risk</option>
          <option value="risk">Risk</option>
          <option value="caution">Caution</option>
          <option value="fair">Fair</option>
          <option value="stable">Stable</option>
        </select>
        <input id="channel" type="text" placeholder="Acquisition channel" />
        <input id="product" type="text" placeholder="Product" />
        <button type="submit">Apply</button>
      </form>
      <table>
        <thead>
          <tr><th>Customer</th><th>Age</th><th>Media</th><th>Product</th><th>Channel</th><th>Contract end</th><th>Risk</th><th></th></tr>
        </thead>
        <tbody id="rows"></tbody>
      </table>
      <div id="sentinel"></div>
      <div class="status" id="status"></div>
    </section>

    <section class="card" id="detail" hidden>
      <header>
        <h2 id="detail-title">Customer</h2>
        <div>
          <select id="detail-month"></select>
          <button type="button" id="detail-close">Close</button>
        </div>
      </header>
      <p id="detail-probability"></p>
      <ul id="detail-factors"></ul>
      <ul id="detail-strategies"></ul>
    </section>
  </main>
  <script>
    const riskColors = {{RISK_COLORS}};
    const backendRisk = {{RISK_LABELS}};
    const sessionId = document.querySelector('.app').dataset.session;
    const monthEl = document.getElementById('month');
    const chartTypeEl = document.getElementById('chart-type');
    const rowsEl = document.getElementById('rows');
    const statusEl = document.getElementById('status');
    const detailEl = document.getElementById('detail');
    const detailMonthEl = document.getElementById('detail-month');
    let observer = null;
    let observedSentinel = null;

    const setStatus = (message, type) => {
      statusEl.textContent = message || '';
      statusEl.dataset.type = type || '';
    };

    const escapeHtml = (value) => String(value ?? '')
      .replace(/&/g, '&amp;')
      .replace(/</g, '&lt;')
      .replace(/>/g, '&gt;')
      .replace(/"/g, '&quot;')
      .replace(/'/g, '&#39;');

    const api = async (path, options = {}) => {
      const response = await fetch(path, {
        headers: { 'Content-Type': 'application/json', 'X-Session-Id': sessionId },
        ...options
      });
      if (!response.ok) {
        throw new Error(await response.text());
      }
      return response.status === 202 || response.status === 204 ? null : response.json();
    };

    const trendText = (trend) => {
      if (!trend.direction) {
        return '';
      }
      const arrow = trend.direction === 'up' ? '▲' : trend.direction === 'down' ? '▼' : '■';
      return `<span class="trend-${trend.direction}">${arrow} ${trend.percentage}%</span>`;
    };

    const loadOverview = async () => {
      const data = await api(`/api/overview?month=${monthEl.value}`);
      document.getElementById('total').textContent = data.total.formatted;
      document.getElementById('churn').textContent = data.churn.formatted;
      document.getElementById('new').textContent = data.new_customers.formatted;
      document.getElementById('total-trend').innerHTML = trendText(data.total.trend);
      document.getElementById('churn-trend').innerHTML = trendText(data.churn.trend);
      document.getElementById('new-trend').innerHTML = trendText(data.new_customers.trend);
      document.getElementById('churn-rate').textContent = `${data.churn.rate}% of customers`;
      document.getElementById('new-rate').textContent = `${data.new_customers.rate}% of customers`;
      document.getElementById('churn-reasons').innerHTML = data.churn_reasons
        .map((r) => `<li>${escapeHtml(r.reason)}: ${r.percentage.toFixed(1)}%</li>`)
        .join('');
      document.getElementById('high-risk').innerHTML = data.high_risk_customers.map((c) => `
        <tr>
          <td>${escapeHtml(c.sha2_hash.slice(0, 12))}…</td>
          <td>${escapeHtml(c.last_access)}</td>
          <td>${escapeHtml(c.churn_call)}</td>
          <td>${(c.churn_risk * 100).toFixed(1)}%</td>
          <td>${c.months_remaining}</td>
        </tr>`).join('');
    };

    const loadRiskAnalysis = async () => {
      const data = await api(`/api/risk-analysis?month=${monthEl.value}`);
      document.getElementById('risk-distribution').innerHTML = Object.entries(data.distribution)
        .map(([label, count]) => `<li>${riskBadge(label)} ${Number(count)}</li>`)
        .join('');
      document.getElementById('risk-factors').innerHTML = data.churn_factors
        .map((f) => `<li>${escapeHtml(f.factor)}: ${(f.impact * 100).toFixed(1)}%</li>`)
        .join('');
    };

    const riskBadge = (label) => {
      const key = backendRisk[label] || label;
      if (!key) {
        return '';
      }
      return `<span class="badge" style="background:${riskColors[key] || '#53565a'}">${escapeHtml(key)}</span>`;
    };

    const renderRows = (page) => {
      rowsEl.innerHTML = page.rows.map((row) => `
        <tr data-id="${escapeHtml(row.sha2_hash)}">
          <td>${escapeHtml(row.sha2_hash.slice(0, 12))}…</td>
          <td>${escapeHtml(row.AGE_GRP10)}</td>
          <td>${escapeHtml(row.MEDIA_NM_GRP)}</td>
          <td>${escapeHtml(row.PROD_NM_GRP)}</td>
          <td>${escapeHtml(row.SCRB_PATH_NM_GRP)}</td>
          <td>${escapeHtml(row.AGMT_END_YMD)}</td>
          <td>${riskBadge(row.customer_category)}</td>
          <td><button type="button" class="copy" data-id="${escapeHtml(row.sha2_hash)}">Copy</button></td>
        </tr>`).join('');
      setStatus(page.notice, page.notice ? 'error' : '');
      attachSentinel();
    };

    const fetchNext = async () => {
      renderRows(await api('/api/customers/next', { method: 'POST' }));
    };

    // One observer per sentinel element; replaced sentinels get a fresh one.
    const attachSentinel = () => {
      const sentinel = document.getElementById('sentinel');
      if (sentinel === observedSentinel) {
        return;
      }
      if (observer) {
        observer.disconnect();
      }
      observedSentinel = sentinel;
      observer = new IntersectionObserver(([entry]) => {
        if (entry.isIntersecting) {
          fetchNext().catch((err) => setStatus(err.message, 'error'));
        }
      }, { threshold: 1 });
      observer.observe(sentinel);
    };

    const applyFilters = async (event) => {
      if (event) {
        event.preventDefault();
      }
      const body = {
        search: document.getElementById('search').value,
        risk: document.getElementById('risk').value || null,
        acquisition_channel: document.getElementById('channel').value || null,
        product: document.getElementById('product').value || null
      };
      rowsEl.innerHTML = '';
      renderRows(await api('/api/customers/filter', { method: 'POST', body: JSON.stringify(body) }));
    };

    const renderDetail = (view) => {
      if (view.phase === 'closed' || view.phase === 'idle') {
        detailEl.hidden = true;
        return;
      }
      detailEl.hidden = false;
      document.getElementById('detail-title').textContent = view.customer_id;
      detailMonthEl.innerHTML = view.available_months
        .map((m) => `<option value="${m}" ${m === view.selected_month ? 'selected' : ''}>Month ${m}</option>`)
        .join('');
      const probability = view.churn_probability === null ? '-' : `${view.churn_probability}%`;
      document.getElementById('detail-probability').innerHTML =
        `Churn probability ${probability} ${view.risk ? riskBadge(view.risk) : ''}`;
      document.getElementById('detail-factors').innerHTML = view.factors
        .map((f) => `<li>${escapeHtml(f.factor)}: ${f.impact.toFixed(2)}%</li>`)
        .join('');
      document.getElementById('detail-strategies').innerHTML = view.strategies
        .map((s) => `<li>${escapeHtml(s.title)}</li>`)
        .join('');
    };

    rowsEl.addEventListener('click', async (event) => {
      const copy = event.target.closest('.copy');
      if (copy) {
        event.stopPropagation();
        await navigator.clipboard.writeText(copy.dataset.id).catch(() => {});
        api(`/api/customers/${encodeURIComponent(copy.dataset.id)}/copy`, { method: 'POST' }).catch(() => {});
        return;
      }
      const row = event.target.closest('tr');
      if (row) {
        detailEl.hidden = false;
        renderDetail(await api('/api/detail', {
          method: 'POST',
          body: JSON.stringify({ customer_id: row.dataset.id })
        }));
      }
    });

    detailMonthEl.addEventListener('change', async () => {
      renderDetail(await api('/api/detail/month', {
        method: 'POST',
        body: JSON.stringify({ month: Number(detailMonthEl.value) })
      }));
    });

    document.getElementById('detail-close').addEventListener('click', async () => {
      renderDetail(await api('/api/detail', { method: 'DELETE' }));
    });

    chartTypeEl.addEventListener('change', () => {
      api('/api/preferences', {
        method: 'PUT',
        body: JSON.stringify({ chart_type: chartTypeEl.value })
      }).catch((err) => setStatus(err.message, 'error'));
    });

    for (let m = 2; m <= 12; m += 1) {
      monthEl.insertAdjacentHTML('beforeend', `<option value="${m}" ${m === 12 ? 'selected' : ''}>Month ${m}</option>`);
    }
    chartTypeEl.value = document.querySelector('.app').dataset.chartType;
    window.addEventListener('pagehide', () => {
      fetch('/api/session', {
        method: 'DELETE',
        keepalive: true,
        headers: { 'X-Session-Id': sessionId }
      }).catch(() => {});
    });
    monthEl.addEventListener('change', () => {
      loadOverview().catch((err) => setStatus(err.message, 'error'));
      loadRiskAnalysis().catch((err) => setStatus(err.message, 'error'));
    });
    document.getElementById('filters').addEventListener('submit', applyFilters);

    loadOverview().catch((err) => setStatus(err.message, 'error'));
    loadRiskAnalysis().catch((err) => setStatus(err.message, 'error'));
    applyFilters().catch((err) => setStatus(err.message, 'error'));
  </script>
</body>
</html>
"#;
