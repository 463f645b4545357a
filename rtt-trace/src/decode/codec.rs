//! Fixed-width trace record codec.
//!
//! One record is [`TRACE_RECORD_SIZE`] bytes: a kind byte followed by three
//! little-endian `u32` words (timestamp, handle, auxiliary data). Decoding fails
//! only when the slice is too short or the kind byte is not a known kind.

use rtt_trace_common::{
    RECORD_DATA_OFFSET, RECORD_HANDLE_OFFSET, RECORD_KIND_OFFSET, RECORD_TIMESTAMP_OFFSET,
    TRACE_EVENT_FREE, TRACE_EVENT_ISR_ENTER, TRACE_EVENT_ISR_EXIT, TRACE_EVENT_MALLOC,
    TRACE_EVENT_MUTEX_CREATE, TRACE_EVENT_MUTEX_GIVE, TRACE_EVENT_MUTEX_TAKE,
    TRACE_EVENT_QUEUE_CREATE, TRACE_EVENT_QUEUE_RECEIVE, TRACE_EVENT_QUEUE_SEND,
    TRACE_EVENT_SEMAPHORE_CREATE, TRACE_EVENT_SEMAPHORE_GIVE, TRACE_EVENT_SEMAPHORE_TAKE,
    TRACE_EVENT_TASK_CREATE, TRACE_EVENT_TASK_DELETE, TRACE_EVENT_TASK_READY,
    TRACE_EVENT_TASK_RESUMED, TRACE_EVENT_TASK_SUSPENDED, TRACE_EVENT_TASK_SWITCHED_IN,
    TRACE_EVENT_TASK_SWITCHED_OUT, TRACE_EVENT_TIMER_CREATE, TRACE_EVENT_TIMER_START,
    TRACE_EVENT_TIMER_STOP, TRACE_RECORD_SIZE,
};
use std::fmt;

use crate::domain::Handle;

/// Symbolic event kind.
///
/// The discriminants are the wire bytes, so `kind as u8` is the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum EventKind {
    TaskSwitchedIn = TRACE_EVENT_TASK_SWITCHED_IN,
    TaskSwitchedOut = TRACE_EVENT_TASK_SWITCHED_OUT,
    TaskCreate = TRACE_EVENT_TASK_CREATE,
    TaskDelete = TRACE_EVENT_TASK_DELETE,
    TaskReady = TRACE_EVENT_TASK_READY,
    TaskSuspended = TRACE_EVENT_TASK_SUSPENDED,
    TaskResumed = TRACE_EVENT_TASK_RESUMED,
    IsrEnter = TRACE_EVENT_ISR_ENTER,
    IsrExit = TRACE_EVENT_ISR_EXIT,
    QueueCreate = TRACE_EVENT_QUEUE_CREATE,
    QueueSend = TRACE_EVENT_QUEUE_SEND,
    QueueReceive = TRACE_EVENT_QUEUE_RECEIVE,
    SemaphoreCreate = TRACE_EVENT_SEMAPHORE_CREATE,
    SemaphoreGive = TRACE_EVENT_SEMAPHORE_GIVE,
    SemaphoreTake = TRACE_EVENT_SEMAPHORE_TAKE,
    MutexCreate = TRACE_EVENT_MUTEX_CREATE,
    MutexGive = TRACE_EVENT_MUTEX_GIVE,
    MutexTake = TRACE_EVENT_MUTEX_TAKE,
    TimerCreate = TRACE_EVENT_TIMER_CREATE,
    TimerStart = TRACE_EVENT_TIMER_START,
    TimerStop = TRACE_EVENT_TIMER_STOP,
    Malloc = TRACE_EVENT_MALLOC,
    Free = TRACE_EVENT_FREE,
}

/// Every known kind, in wire order.
///
/// Shared by the decoder's classification and the exporters' labeling.
pub static EVENT_KINDS: [EventKind; 23] = [
    EventKind::TaskSwitchedIn,
    EventKind::TaskSwitchedOut,
    EventKind::TaskCreate,
    EventKind::TaskDelete,
    EventKind::TaskReady,
    EventKind::TaskSuspended,
    EventKind::TaskResumed,
    EventKind::IsrEnter,
    EventKind::IsrExit,
    EventKind::QueueCreate,
    EventKind::QueueSend,
    EventKind::QueueReceive,
    EventKind::SemaphoreCreate,
    EventKind::SemaphoreGive,
    EventKind::SemaphoreTake,
    EventKind::MutexCreate,
    EventKind::MutexGive,
    EventKind::MutexTake,
    EventKind::TimerCreate,
    EventKind::TimerStart,
    EventKind::TimerStop,
    EventKind::Malloc,
    EventKind::Free,
];

impl EventKind {
    /// Classify a wire byte, `None` for unknown kinds
    pub fn from_byte(byte: u8) -> Option<Self> {
        EVENT_KINDS.iter().copied().find(|kind| *kind as u8 == byte)
    }

    /// Upper-case wire name (e.g. `TASK_SWITCHED_IN`)
    pub fn name(self) -> &'static str {
        match self {
            EventKind::TaskSwitchedIn => "TASK_SWITCHED_IN",
            EventKind::TaskSwitchedOut => "TASK_SWITCHED_OUT",
            EventKind::TaskCreate => "TASK_CREATE",
            EventKind::TaskDelete => "TASK_DELETE",
            EventKind::TaskReady => "TASK_READY",
            EventKind::TaskSuspended => "TASK_SUSPENDED",
            EventKind::TaskResumed => "TASK_RESUMED",
            EventKind::IsrEnter => "ISR_ENTER",
            EventKind::IsrExit => "ISR_EXIT",
            EventKind::QueueCreate => "QUEUE_CREATE",
            EventKind::QueueSend => "QUEUE_SEND",
            EventKind::QueueReceive => "QUEUE_RECEIVE",
            EventKind::SemaphoreCreate => "SEMAPHORE_CREATE",
            EventKind::SemaphoreGive => "SEMAPHORE_GIVE",
            EventKind::SemaphoreTake => "SEMAPHORE_TAKE",
            EventKind::MutexCreate => "MUTEX_CREATE",
            EventKind::MutexGive => "MUTEX_GIVE",
            EventKind::MutexTake => "MUTEX_TAKE",
            EventKind::TimerCreate => "TIMER_CREATE",
            EventKind::TimerStart => "TIMER_START",
            EventKind::TimerStop => "TIMER_STOP",
            EventKind::Malloc => "MALLOC",
            EventKind::Free => "FREE",
        }
    }

    /// Title-case label used by trace viewers (e.g. `Queue Send`)
    pub fn label(self) -> String {
        self.name()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => {
                        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                    }
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }

    /// True for the switch and lifecycle kinds whose handle is a task
    pub fn is_task_event(self) -> bool {
        matches!(
            self,
            EventKind::TaskSwitchedIn
                | EventKind::TaskSwitchedOut
                | EventKind::TaskCreate
                | EventKind::TaskDelete
                | EventKind::TaskReady
                | EventKind::TaskSuspended
                | EventKind::TaskResumed
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One decoded trace record. Immutable once decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    pub kind: EventKind,
    /// Target tick count (DWT cycle counter)
    pub timestamp: u32,
    pub handle: Handle,
    /// Kind-dependent payload (allocation size, from-ISR flag, ...)
    pub data: u32,
}

impl EventRecord {
    pub fn new(kind: EventKind, timestamp: u32, handle: u32, data: u32) -> Self {
        Self { kind, timestamp, handle: Handle(handle), data }
    }

    /// Decode a record from the start of `bytes`.
    ///
    /// Returns `None` ("not a record") when fewer than [`TRACE_RECORD_SIZE`]
    /// bytes are available or the kind byte is unknown. Bytes past the first
    /// record are ignored.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < TRACE_RECORD_SIZE {
            return None;
        }
        let kind = EventKind::from_byte(bytes[RECORD_KIND_OFFSET])?;

        Some(Self {
            kind,
            timestamp: read_u32_le(bytes, RECORD_TIMESTAMP_OFFSET),
            handle: Handle(read_u32_le(bytes, RECORD_HANDLE_OFFSET)),
            data: read_u32_le(bytes, RECORD_DATA_OFFSET),
        })
    }

    /// Encode to the packed wire layout (exact inverse of [`EventRecord::decode`])
    pub fn encode(&self) -> [u8; TRACE_RECORD_SIZE] {
        let mut out = [0u8; TRACE_RECORD_SIZE];
        out[RECORD_KIND_OFFSET] = self.kind as u8;
        out[RECORD_TIMESTAMP_OFFSET..RECORD_HANDLE_OFFSET]
            .copy_from_slice(&self.timestamp.to_le_bytes());
        out[RECORD_HANDLE_OFFSET..RECORD_DATA_OFFSET].copy_from_slice(&self.handle.0.to_le_bytes());
        out[RECORD_DATA_OFFSET..TRACE_RECORD_SIZE].copy_from_slice(&self.data.to_le_bytes());
        out
    }
}

/// Caller guarantees `offset + 4 <= bytes.len()`.
fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}
