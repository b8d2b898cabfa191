//! macOS CPU introspection via Mach kernel interfaces
//!
//! Every kernel-allocated array (thread lists, per-core counters) is owned
//! by [`VmBuffer`], which releases it with `mach_vm_deallocate` on drop, so
//! early returns cannot leak ports or counter pages.

#![allow(non_camel_case_types)]

use std::mem;
use std::ptr;
use std::time::Instant;

use mach::kern_return::{kern_return_t, KERN_SUCCESS};
use mach::mach_port::mach_port_deallocate;
use mach::message::mach_msg_type_number_t;
use mach::port::mach_port_t;
use mach::traps::mach_task_self;
use mach::vm::mach_vm_deallocate;
use mach::vm_types::{integer_t, natural_t};

use super::probe::{blend_cpu, system_usage_percent, CoreTicks};

const THREAD_BASIC_INFO: integer_t = 3;
const TH_USAGE_SCALE: integer_t = 1000;
const TH_FLAGS_IDLE: integer_t = 0x2;

const TASK_VM_INFO: integer_t = 22;
const PROCESSOR_CPU_LOAD_INFO: integer_t = 2;

const CPU_STATE_USER: usize = 0;
const CPU_STATE_SYSTEM: usize = 1;
const CPU_STATE_IDLE: usize = 2;
const CPU_STATE_NICE: usize = 3;

#[repr(C)]
#[derive(Clone, Copy, Default)]
struct time_value_t {
    seconds: integer_t,
    microseconds: integer_t,
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
struct thread_basic_info {
    user_time: time_value_t,
    system_time: time_value_t,
    cpu_usage: integer_t,
    policy: integer_t,
    run_state: integer_t,
    flags: integer_t,
    suspend_count: integer_t,
    sleep_time: integer_t,
}

/// Prefix of `task_vm_info` up to and including `phys_footprint`; the count
/// passed to `task_info` limits the fill to exactly these fields.
#[repr(C)]
#[derive(Clone, Copy, Default)]
struct task_vm_info_footprint {
    virtual_size: u64,
    region_count: integer_t,
    page_size: integer_t,
    resident_size: u64,
    resident_size_peak: u64,
    device: u64,
    device_peak: u64,
    internal: u64,
    internal_peak: u64,
    external: u64,
    external_peak: u64,
    reusable: u64,
    reusable_peak: u64,
    purgeable_volatile_pmap: u64,
    purgeable_volatile_resident: u64,
    purgeable_volatile_virtual: u64,
    compressed: u64,
    compressed_peak: u64,
    compressed_lifetime: u64,
    phys_footprint: u64,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct processor_cpu_load_info {
    cpu_ticks: [natural_t; 4],
}

extern "C" {
    fn task_threads(
        task: mach_port_t,
        thread_list: *mut *mut mach_port_t,
        count: *mut mach_msg_type_number_t,
    ) -> kern_return_t;

    fn thread_info(
        thread: mach_port_t,
        flavor: integer_t,
        info: *mut integer_t,
        count: *mut mach_msg_type_number_t,
    ) -> kern_return_t;

    fn task_info(
        task: mach_port_t,
        flavor: integer_t,
        info: *mut integer_t,
        count: *mut mach_msg_type_number_t,
    ) -> kern_return_t;

    fn mach_host_self() -> mach_port_t;

    fn host_processor_info(
        host: mach_port_t,
        flavor: integer_t,
        count: *mut natural_t,
        info: *mut *mut integer_t,
        info_count: *mut mach_msg_type_number_t,
    ) -> kern_return_t;
}

/// Kernel-allocated array released with `mach_vm_deallocate` when dropped.
struct VmBuffer<T> {
    ptr: *mut T,
    count: usize,
}

impl<T> VmBuffer<T> {
    /// Takes ownership of `count` elements at `ptr`, as returned by a Mach
    /// out-of-line allocation.
    unsafe fn new(ptr: *mut T, count: usize) -> Self {
        Self { ptr, count }
    }

    fn as_slice(&self) -> &[T] {
        if self.ptr.is_null() || self.count == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.ptr, self.count) }
    }
}

impl<T> Drop for VmBuffer<T> {
    fn drop(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        let bytes = (self.count * mem::size_of::<T>()) as u64;
        unsafe {
            mach_vm_deallocate(mach_task_self(), self.ptr as u64, bytes);
        }
    }
}

fn time_value_us(t: time_value_t) -> u64 {
    t.seconds as u64 * 1_000_000 + t.microseconds as u64
}

pub struct CpuUsageProbe {
    prev_total_us: u64,
    prev_instant: Option<Instant>,
    prev_cores: Vec<CoreTicks>,
    last_usage: f64,
}

impl CpuUsageProbe {
    pub fn new() -> Self {
        Self {
            prev_total_us: 0,
            prev_instant: None,
            prev_cores: Vec::new(),
            last_usage: 0.0,
        }
    }

    /// App CPU usage percent. Fail-soft: a failed kernel call repeats the
    /// last good value rather than dropping to zero.
    pub fn poll(&mut self) -> Option<f64> {
        match self.sample() {
            Some(usage) => {
                self.last_usage = usage;
                Some(usage)
            }
            None => {
                tracing::warn!("CPU probe read failed, keeping {:.1}%", self.last_usage);
                Some(self.last_usage)
            }
        }
    }

    /// All-core system usage from per-processor tick deltas; `None` until a
    /// previous snapshot exists.
    pub fn system_usage(&mut self) -> Option<f64> {
        let current = read_core_ticks()?;
        let usage = system_usage_percent(&self.prev_cores, &current);
        self.prev_cores = current;
        usage
    }

    fn sample(&mut self) -> Option<f64> {
        let now = Instant::now();
        let (thread_based, total_us) = read_thread_usage()?;

        let delta_based = self
            .prev_instant
            .map(|t| now.duration_since(t).as_secs_f64())
            .filter(|dt| *dt > 0.0)
            .map(|dt| {
                let delta_us = total_us.saturating_sub(self.prev_total_us) as f64;
                (delta_us / 1e6) / dt * 100.0
            });

        self.prev_total_us = total_us;
        self.prev_instant = Some(now);

        Some(blend_cpu(thread_based, delta_based))
    }
}

/// Sum of non-idle scaled thread usage plus cumulative thread CPU µs.
fn read_thread_usage() -> Option<(f64, u64)> {
    unsafe {
        let task = mach_task_self();
        let mut thread_list: *mut mach_port_t = ptr::null_mut();
        let mut thread_count: mach_msg_type_number_t = 0;
        if task_threads(task, &mut thread_list, &mut thread_count) != KERN_SUCCESS {
            return None;
        }
        let threads = VmBuffer::new(thread_list, thread_count as usize);

        let mut thread_based = 0.0;
        let mut total_us = 0u64;
        for &thread in threads.as_slice() {
            let mut info = thread_basic_info::default();
            let mut count = (mem::size_of::<thread_basic_info>() / mem::size_of::<integer_t>())
                as mach_msg_type_number_t;
            let kr = thread_info(
                thread,
                THREAD_BASIC_INFO,
                &mut info as *mut thread_basic_info as *mut integer_t,
                &mut count,
            );
            mach_port_deallocate(task, thread);
            if kr != KERN_SUCCESS {
                continue;
            }
            total_us += time_value_us(info.user_time) + time_value_us(info.system_time);
            if info.flags & TH_FLAGS_IDLE == 0 {
                thread_based += info.cpu_usage as f64 / TH_USAGE_SCALE as f64 * 100.0;
            }
        }
        Some((thread_based, total_us))
    }
}

fn read_core_ticks() -> Option<Vec<CoreTicks>> {
    unsafe {
        let mut cpu_count: natural_t = 0;
        let mut info: *mut integer_t = ptr::null_mut();
        let mut info_count: mach_msg_type_number_t = 0;
        let kr = host_processor_info(
            mach_host_self(),
            PROCESSOR_CPU_LOAD_INFO,
            &mut cpu_count,
            &mut info,
            &mut info_count,
        );
        if kr != KERN_SUCCESS {
            return None;
        }
        let loads = VmBuffer::new(info as *mut processor_cpu_load_info, cpu_count as usize);
        let cores = loads
            .as_slice()
            .iter()
            .map(|load| CoreTicks {
                user: load.cpu_ticks[CPU_STATE_USER] as u64,
                system: load.cpu_ticks[CPU_STATE_SYSTEM] as u64,
                nice: load.cpu_ticks[CPU_STATE_NICE] as u64,
                idle: load.cpu_ticks[CPU_STATE_IDLE] as u64,
            })
            .collect();
        Some(cores)
    }
}

/// Physical memory footprint of the current process in MB, the figure
/// Activity Monitor reports; `None` when the kernel refuses the query.
pub fn physical_footprint_mb() -> Option<f64> {
    unsafe {
        let mut info = task_vm_info_footprint::default();
        let mut count = (mem::size_of::<task_vm_info_footprint>() / mem::size_of::<integer_t>())
            as mach_msg_type_number_t;
        let kr = task_info(
            mach_task_self(),
            TASK_VM_INFO,
            &mut info as *mut task_vm_info_footprint as *mut integer_t,
            &mut count,
        );
        if kr != KERN_SUCCESS {
            return None;
        }
        Some(info.phys_footprint as f64 / (1024.0 * 1024.0))
    }
}
