/// Driver script template.
///
/// The script only sets up logging and hands the embedded [`TargetPlan`] to
/// `cloudrep drive`; operator flags (`-b`, `-w`, `-r`, ...) are passed through.
/// `CLOUDREP_BIN` selects the driver binary when it is not on `PATH`.
///
/// [`TargetPlan`]: cloudrep_model::TargetPlan
pub const SCRIPT_TEMPLATE: &str = r#"#!/bin/bash
#
# Benchmark driver for {{.MachineType}} on {{.Cloud}} ({{.Group}}).
# Generated by cloudrep; changes are overwritten by the next generate run.
#
# cluster: $USER-{{.Cluster}}
# nodes: {{.Nodes}}
# lifetime: {{.Lifetime}}
# deploy args: {{.EvaledArgs}}
#
# Usage: $0 [-b <bootstrap>]... [-w <benchmark>]... [-r] [-d] [-c <binary>] [-n <nodes>]
#           [-I <io args>] [-N <net args>] [-C <cpu args>] [-T <tpcc args>]
# Run with --help for details.

set -e
scriptName=$(basename "${0%.*}")
logdir="$(dirname "$0")/../logs/${scriptName}"
mkdir -p "$logdir"

# Mirror stdout and stderr into the driver log.
exec &> >(tee -a "$logdir/driver.log")

exec "${CLOUDREP_BIN:-cloudrep}" drive --log-dir "$logdir" --plan - "$@" <<'CLOUDREP_PLAN'
{{.Plan}}
CLOUDREP_PLAN
"#;
